//! The linear dialogue state machine.

use sitepulse_client::{AuditApi, ClientError, CreateJobRequest};
use sitepulse_core::JobId;

use crate::script::{
    parse_competitors, parse_market, PROMPT_COMPETITORS, PROMPT_MARKET, PROMPT_SUBMITTING,
};

/// Dialogue steps, strictly forward — no step is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStep {
    CollectingCompetitors,
    CollectingMarket,
    Submitting,
    Done,
}

/// Parameters collected from the user so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    /// Competitor URLs, normalized to absolute form.
    pub competitors: Vec<String>,
    /// Free-text market descriptor, `None` when skipped.
    pub market: Option<String>,
}

/// What the caller should do after handing the dialogue a user reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueAction {
    /// Show the next scripted assistant message and wait for a reply.
    Prompt(&'static str),
    /// All parameters collected; call [`Dialogue::submit`].
    ReadyToSubmit,
    /// The reply arrived after collection finished and was ignored.
    Ignored,
}

/// Collects pre-job parameters via a scripted chat and creates the job.
///
/// Created when the dashboard opens with no job yet started; the owning
/// view destroys it once the job transitions to running. Submission
/// failure is terminal for the dialogue: the step stays `Submitting` and
/// the error propagates to the caller, which decides whether to re-show
/// the dialogue or surface the failure — the dialogue never vanishes
/// silently.
#[derive(Debug)]
pub struct Dialogue {
    job_url: String,
    step: DialogueStep,
    collected: Collected,
}

impl Dialogue {
    /// Start a dialogue for auditing `job_url`.
    pub fn new(job_url: String) -> Self {
        Self {
            job_url,
            step: DialogueStep::CollectingCompetitors,
            collected: Collected::default(),
        }
    }

    /// The assistant message shown when the dialogue opens.
    pub fn opening_prompt(&self) -> &'static str {
        PROMPT_COMPETITORS
    }

    /// The message to show while the job is being created.
    pub fn submitting_prompt(&self) -> &'static str {
        PROMPT_SUBMITTING
    }

    pub fn step(&self) -> DialogueStep {
        self.step
    }

    pub fn collected(&self) -> &Collected {
        &self.collected
    }

    /// Advance the machine with a free-text user reply.
    pub fn handle_reply(&mut self, reply: &str) -> DialogueAction {
        match self.step {
            DialogueStep::CollectingCompetitors => {
                self.collected.competitors = parse_competitors(reply);
                self.step = DialogueStep::CollectingMarket;
                tracing::debug!(
                    competitors = self.collected.competitors.len(),
                    "Competitors collected",
                );
                DialogueAction::Prompt(PROMPT_MARKET)
            }
            DialogueStep::CollectingMarket => {
                self.collected.market = parse_market(reply);
                self.step = DialogueStep::Submitting;
                DialogueAction::ReadyToSubmit
            }
            DialogueStep::Submitting | DialogueStep::Done => DialogueAction::Ignored,
        }
    }

    /// Create the audit job from the collected parameters.
    ///
    /// On success the dialogue is `Done` and the new job id is returned.
    /// On failure the error propagates and the step stays `Submitting`.
    pub async fn submit(&mut self, api: &AuditApi) -> Result<JobId, ClientError> {
        let request = CreateJobRequest {
            url: self.job_url.clone(),
            language: "en".into(),
            competitors: self.collected.competitors.clone(),
            market: self.collected.market.clone(),
        };

        let created = api.create_job(&request).await?;
        self.step = DialogueStep::Done;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn walks_the_steps_in_order() {
        let mut dialogue = Dialogue::new("https://example.com".into());
        assert_eq!(dialogue.step(), DialogueStep::CollectingCompetitors);
        assert_eq!(dialogue.opening_prompt(), PROMPT_COMPETITORS);

        let action = dialogue.handle_reply("acme.com, widgets.io");
        assert_eq!(action, DialogueAction::Prompt(PROMPT_MARKET));
        assert_eq!(dialogue.step(), DialogueStep::CollectingMarket);

        let action = dialogue.handle_reply("US");
        assert_eq!(action, DialogueAction::ReadyToSubmit);
        assert_eq!(dialogue.step(), DialogueStep::Submitting);

        assert_eq!(
            dialogue.collected(),
            &Collected {
                competitors: vec!["https://acme.com".into(), "https://widgets.io".into()],
                market: Some("US".into()),
            }
        );
    }

    #[test]
    fn skipping_both_questions_collects_nothing() {
        let mut dialogue = Dialogue::new("https://example.com".into());
        dialogue.handle_reply("no");
        dialogue.handle_reply("no");
        assert_eq!(dialogue.collected(), &Collected::default());
    }

    #[test]
    fn late_replies_are_ignored() {
        let mut dialogue = Dialogue::new("https://example.com".into());
        dialogue.handle_reply("no");
        dialogue.handle_reply("no");
        assert_eq!(dialogue.handle_reply("another"), DialogueAction::Ignored);
        assert_eq!(dialogue.step(), DialogueStep::Submitting);
    }

    #[tokio::test]
    async fn submit_posts_collected_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .and(body_json(serde_json::json!({
                "url": "https://example.com",
                "language": "en",
                "competitors": ["https://a.com", "https://b.com"],
                "market": "US",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "job-42"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = AuditApi::new(server.uri());
        let mut dialogue = Dialogue::new("https://example.com".into());
        dialogue.handle_reply("a.com,b.com");
        dialogue.handle_reply("US");

        let job_id = dialogue.submit(&api).await.unwrap();
        assert_eq!(job_id, "job-42");
        assert_eq!(dialogue.step(), DialogueStep::Done);
    }

    #[tokio::test]
    async fn failed_submit_propagates_and_stays_in_submitting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = AuditApi::new(server.uri());
        let mut dialogue = Dialogue::new("https://example.com".into());
        dialogue.handle_reply("no");
        dialogue.handle_reply("no");

        let result = dialogue.submit(&api).await;
        assert_matches!(result, Err(ClientError::RequestFailed { status: 500 }));
        assert_eq!(dialogue.step(), DialogueStep::Submitting);
    }
}
