//! Judge persona and evidence bundle.

use goalforge_ledger::HabitProfile;

use crate::context::VerificationContext;

const PART_SEPARATOR: &str = "\n\n---\n\n";

const RESPONSE_FORMAT: &str =
    r#"Respond in JSON format: { "verified": true/false, "confidence": 0-100, "reason": "brief explanation" }"#;

/// System prompt stating the habit's acceptance bar.
pub fn system_prompt(profile: &HabitProfile) -> String {
    let evidence: String = profile
        .evidence_kinds
        .iter()
        .map(|kind| format!("- {}\n", kind))
        .collect();

    format!(
        "You are a verification agent for a {name} habit tracker. Your job is to verify \
         whether a user has actually completed their {name} task on the given date. \
         You will be given proof which may include:\n{evidence}\n\
         Analyze the proof and decide whether it is genuine. {bar}\n\n{format}",
        name = profile.name,
        evidence = evidence,
        bar = profile.acceptance_bar,
        format = RESPONSE_FORMAT,
    )
}

/// Evidence parts in the order the judge sees them: structured stage data,
/// then the user's description, then the image reference.
pub fn evidence_parts(ctx: &VerificationContext) -> Vec<String> {
    let mut parts = Vec::new();
    for evidence in &ctx.evidence {
        let pretty = serde_json::to_string_pretty(&evidence.data)
            .unwrap_or_else(|_| evidence.data.to_string());
        parts.push(format!("{}:\n{}", evidence.kind.label(), pretty));
    }
    if let Some(text) = &ctx.proof_text {
        parts.push(format!("User's Proof Description:\n{}", text));
    }
    if let Some(url) = &ctx.proof_image_url {
        parts.push(format!("User has also submitted a proof image (URL: {})", url));
    }
    parts
}

/// User message addressed to the persona, or `None` without any evidence.
pub fn user_message(ctx: &VerificationContext) -> Option<String> {
    let parts = evidence_parts(ctx);
    if parts.is_empty() {
        return None;
    }
    Some(format!(
        "Please verify the following proof for a {} task completion on {}:\n\n{}",
        ctx.habit.name(),
        ctx.date,
        parts.join(PART_SEPARATOR)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Evidence, EvidenceKind};
    use chrono::NaiveDate;
    use goalforge_ledger::HabitType;

    #[test]
    fn test_system_prompt_carries_bar() {
        let prompt = system_prompt(HabitType::Gym.profile());
        assert!(prompt.contains("Gym habit tracker"));
        assert!(prompt.contains("at least 20 minutes"));
        assert!(prompt.contains("- workout photos\n"));
        assert!(prompt.ends_with(RESPONSE_FORMAT));
    }

    #[test]
    fn test_user_message_orders_parts() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let ctx = VerificationContext::new(HabitType::Coding, date)
            .with_evidence(Evidence::new(
                EvidenceKind::GitHub,
                serde_json::json!({"verified": false}),
            ))
            .with_proof_text(Some("Fixed the parser".into()))
            .with_proof_image(Some("https://img.example/1.png".into()));

        let message = user_message(&ctx).unwrap();
        assert!(message.starts_with(
            "Please verify the following proof for a Coding task completion on 2026-10-14:\n\n"
        ));
        let github = message.find("GitHub Activity Data:").unwrap();
        let text = message.find("User's Proof Description:\nFixed the parser").unwrap();
        let image = message.find("(URL: https://img.example/1.png)").unwrap();
        assert!(github < text && text < image);
        assert_eq!(message.matches("\n\n---\n\n").count(), 2);
    }

    #[test]
    fn test_no_evidence_no_message() {
        assert!(user_message(&VerificationContext::today(HabitType::Dsa)).is_none());
    }
}
