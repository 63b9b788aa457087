//! Prompt construction for posting enrichment.

use crate::domains::ingestion::models::RawPosting;

const DESCRIPTION_PROMPT_LIMIT: usize = 4000;

pub const SYSTEM_PROMPT: &str = "You are an expert Nigerian job market analyst. \
Analyze the job posting and extract every field for intelligent job matching. \
Be comprehensive: include 8-15 title variations in ai_job_titles, every \
applicable level in ai_job_level, and 3-6 industries in ai_industry. \
Default the country to Nigeria when the posting does not say otherwise. \
Keep ai_summary under 280 characters, engaging, and chat-ready. \
Return only data supported by the posting; use null for unknown numbers.";

/// Render the per-record prompt from the raw snapshot's hints.
pub fn user_prompt(raw: &RawPosting) -> String {
    let title = raw.payload_hint("title").unwrap_or("(not provided)");
    let company = raw.payload_hint("company").unwrap_or("(not provided)");
    let location = raw.payload_hint("location").unwrap_or("(not provided)");
    let description = raw
        .payload_hint("description")
        .or_else(|| raw.payload_hint("body"))
        .unwrap_or("(not provided)");
    let description = openai_client::truncate_to_char_boundary(description, DESCRIPTION_PROMPT_LIMIT);

    let mut prompt = format!(
        "CURRENT DATA:\nTitle: {}\nCompany: {}\nLocation: {}\nDescription: {}\n",
        title, company, location, description
    );

    if let Some(employment_type) = raw.payload_hint("employment_type") {
        prompt.push_str(&format!("Employment type: {}\n", employment_type));
    }
    if let Some(salary) = raw.payload_hint("salary") {
        prompt.push_str(&format!("Salary text: {}\n", salary));
    }
    if let Some(url) = raw.url.as_deref() {
        prompt.push_str(&format!("Posting URL: {}\n", url));
    }
    prompt.push_str(&format!("Source: {}\n", raw.source));

    prompt.push_str(
        "\nTASK: Extract the structured attributes for this posting. \
         Focus on the Nigerian job market context.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw_with(payload: serde_json::Value) -> RawPosting {
        RawPosting {
            id: 1,
            source: "jobspy".into(),
            source_job_id: "abc".into(),
            payload,
            url: Some("https://example.com/j/1".into()),
            scraped_at: Utc::now(),
            processed: false,
            error: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_carries_hints() {
        let raw = raw_with(serde_json::json!({
            "title": "Sales Executive",
            "company": "TechCorp",
            "location": "Lagos",
            "description": "Sell software to Nigerian businesses."
        }));
        let prompt = user_prompt(&raw);
        assert!(prompt.contains("Title: Sales Executive"));
        assert!(prompt.contains("Company: TechCorp"));
        assert!(prompt.contains("https://example.com/j/1"));
        assert!(prompt.contains("Source: jobspy"));
    }

    #[test]
    fn missing_hints_are_marked() {
        let raw = raw_with(serde_json::json!({}));
        let prompt = user_prompt(&raw);
        assert!(prompt.contains("Title: (not provided)"));
    }

    #[test]
    fn long_descriptions_are_bounded() {
        let raw = raw_with(serde_json::json!({"description": "y".repeat(20_000)}));
        let prompt = user_prompt(&raw);
        assert!(prompt.len() < 6000);
    }
}
