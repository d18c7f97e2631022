//! Prompt construction for the insight request.

use chrono::DateTime;
use chrono_tz::Tz;

use crate::types::CheckIn;

/// Prior check-ins quoted as history after the latest one.
const HISTORY_LINES: usize = 3;

/// Build the insight prompt, or `None` when there is nothing to analyse.
///
/// The latest check-in is the one with the highest timestamp, regardless of
/// input order.
pub fn build_insight_prompt(recent: &[CheckIn], timezone: Tz) -> Option<String> {
    let mut ordered: Vec<&CheckIn> = recent.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let (latest, earlier) = ordered.split_first()?;
    let history: Vec<String> = earlier
        .iter()
        .take(HISTORY_LINES)
        .map(|c| history_line(c, timezone))
        .collect();
    let history = if history.is_empty() {
        "(no earlier check-ins)".to_string()
    } else {
        history.join("\n")
    };

    Some(format!(
        r#"You are a regulation companion for autistic and ADHD people.

Current data:
- Sensory load: {sensory}/100
- Social battery: {social}/100 (low = empty)

Recent history:
{history}

TASK: Use the context to give ONE short piece of advice (two sentences at most).

ANALYSIS RULES:
1. AFTER A CRISIS (debrief): if the user seems a little better after a recent critical state in the history, connect cause and effect without judgement.
   Example: "Yesterday's shutdown seems linked to the heavy social load noted before it. It makes sense to feel tired."
2. PREVENTION / RECOVERY: if the user is stable but the history shows a large recent energy expense, gently suggest blocking time for a special interest to recover.
   Example: "After yesterday's effort, this could be a good moment to set aside an hour for your special interest."
3. REAL TIME: if everything is calm or this is the first data point, offer a simple maintenance tip.

TONE: soft, non-directive, validating. Never give direct orders ("Do this"). Prefer "It seems that..." and "Perhaps...".
"#,
        sensory = latest.sensory_load,
        social = latest.social_battery,
        history = history,
    ))
}

/// `[YYYY-MM-DD HHh]: Sens:x, Soc:y, Emo:z` in the user's timezone.
fn history_line(check_in: &CheckIn, timezone: Tz) -> String {
    let when = DateTime::from_timestamp_millis(check_in.timestamp)
        .map(|t| t.with_timezone(&timezone).format("%Y-%m-%d %Hh").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    format!(
        "[{}]: Sens:{}, Soc:{}, Emo:{}",
        when, check_in.sensory_load, check_in.social_battery, check_in.emotional_intensity
    )
}
