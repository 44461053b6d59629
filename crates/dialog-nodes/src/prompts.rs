//! Prompt construction for the generation-backed dialog steps.
//!
//! The corpus is the Traditional Chinese publication set of the Taiwan
//! immigration authority, so the instruction prompts are written in
//! Traditional Chinese; only the synthesis step injects the caller's answer
//! language.

use dialog_engine::Passage;

/// Instruction to render the user's question in the corpus language.
pub fn translation_prompt(question: &str) -> String {
    format!("將以下問題翻譯為繁體中文，只輸出翻譯結果：\n{question}")
}

/// Instruction to judge whether the retrieved passages can answer the question.
pub fn grading_prompt(question: &str, docs: &[Passage]) -> String {
    let docs_text = docs
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "問題：{question}\n\n文件：\n{docs_text}\n\n\
         根據以上文件，請判斷這些文件是否足夠回答問題。若內容不相關或不足，請回答「無法回答」。"
    )
}

/// Instruction to answer in the target language, citing passage numbers.
pub fn synthesis_prompt(question: &str, docs: &[Passage], language: &str) -> String {
    let mut combined = String::new();
    for (idx, doc) in docs.iter().enumerate() {
        combined.push_str(&format!("[{}] {}\n\n", idx + 1, doc.text));
    }
    format!(
        "以下資料擷取自台灣移民署公佈資料：\n{combined}\
         請用{language}回答問題「{question}」，並引用來源編號。"
    )
}

/// Phrases in a grading response that mark the evidence as insufficient.
pub fn default_negative_phrases() -> Vec<String> {
    ["不相關", "無法回答", "not relevant", "cannot answer", "insufficient"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Localized prompt fragment asking for one missing profile field.
///
/// Unknown fields fall back to a generic request naming the field.
pub fn profile_prompt_fragment(field: &str, language: &str) -> String {
    if is_chinese(language) {
        match field {
            "nationality" => "請問您的國籍是什麼？".to_string(),
            "visa_type" => "您目前持有什麼簽證？".to_string(),
            other => format!("請提供您的{other}。"),
        }
    } else {
        match field {
            "nationality" => "What is your nationality?".to_string(),
            "visa_type" => "What visa do you currently hold?".to_string(),
            other => format!("Please provide your {other}."),
        }
    }
}

fn is_chinese(language: &str) -> bool {
    let lower = language.to_lowercase();
    lower.starts_with("zh") || lower.contains("chinese") || language.contains("中文")
}
