//! Scoring prompt template.

/// Instruction sent to the model for one author.
///
/// The two fields are the only substitution points of the template.
#[derive(Debug, Clone, Copy)]
pub struct SentimentPrompt<'a> {
    /// Handle without the leading `@`.
    pub handle: &'a str,
    /// Date-grouped tweet block from the batcher.
    pub tweets: &'a str,
}

impl<'a> SentimentPrompt<'a> {
    pub fn new(handle: &'a str, tweets: &'a str) -> Self {
        Self { handle, tweets }
    }

    /// Render the full instruction text.
    pub fn render(&self) -> String {
        format!(
            r#"You are an AI expert with more than ten years of experience who closely follows
what AI researchers and practitioners say on Twitter, and who reads every statement in
the light of that person's earlier positions.

Below are tweets from @{handle}, grouped by the date they were posted:

{tweets}

For each date above, judge how the author feels about the risks and safety of AI.
Score each date with an integer from 0 to 100, where 0 means the author sees no AI risk
and 100 means strong safety concern and a call for regulation.

Answer with a single flat JSON object that maps each date (YYYY-MM-DD) to its score,
for example {{"2024-01-01": 40, "2024-01-02": 75}}.
Return only the JSON object. Do not explain."#,
            handle = self.handle,
            tweets = self.tweets,
        )
    }
}
