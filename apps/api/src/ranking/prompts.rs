// Prompt constants for oracle ranking. German, matching the audience of the job list.

/// System prompt for job ranking. Demands JSON-only output.
pub const RANK_SYSTEM: &str = "Du bist ein Job-Ranking-Assistent. \
    Bewerte Jobs für Quereinsteiger in Innsbruck oder Remote. \
    Gib nur JSON zurück.";

/// Ranking prompt template. Replace `{jobs_json}` before sending.
pub const RANK_PROMPT_TEMPLATE: &str = r#"Bewerte jeden Job von 0-100 (höher ist besser). Gib eine JSON-Liste zurück wie [{"id":"...","score":87}].

Jobs:
{jobs_json}"#;
