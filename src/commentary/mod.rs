//! Match commentary.
//!
//! Turns detected moments into a narrative and summary, either through an
//! external [`CommentaryProvider`] or a deterministic template path. Provider
//! failures of any kind fall back to the templates.

pub mod backend;

pub use backend::{
    create_provider, ChatMessage, ChatRequest, ChatResponse, CommentaryProvider, MessageRole,
    OllamaBackend, TokenUsage,
};

#[cfg(feature = "remote-ai")]
pub use backend::AnthropicBackend;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CommentaryConfig;
use crate::models::{CommentarySource, GameHighlights, GameMoment, MatchResult};

/// Highlights never carry more moments than this.
pub const MAX_MOMENTS: usize = 8;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

static SECTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:\*\*)?(MOMENT\s+(\d+)|NARRATIVE|SUMMARY)(?:\*\*)?\s*:\s*(.+?)\s*$")
        .expect("section line pattern is valid")
});

const NAIL_BITER_MARGIN: u32 = 5;
const CONTROLLED_MARGIN: u32 = 15;

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("commentary provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("commentary response unparseable: {0}")]
    ResponseParseError(String),

    #[error("commentary timed out after {0} seconds")]
    Timeout(u64),

    #[error("commentary response has no {0} line")]
    MissingSection(&'static str),
}

/// Produces [`GameHighlights`] for finished matches.
#[derive(Clone)]
pub struct CommentaryGenerator {
    provider: Option<Arc<dyn CommentaryProvider>>,
    timeout: Duration,
}

impl Default for CommentaryGenerator {
    fn default() -> Self {
        Self::template_only()
    }
}

impl std::fmt::Debug for CommentaryGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentaryGenerator")
            .field("provider", &self.provider_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CommentaryGenerator {
    pub fn new(provider: Arc<dyn CommentaryProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    /// Deterministic templates only.
    pub fn template_only() -> Self {
        Self {
            provider: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn from_config(config: &CommentaryConfig) -> Result<Self, CommentaryError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        Ok(match create_provider(config)? {
            Some(provider) => {
                info!("Commentary provider: {}", provider.name());
                Self::new(provider, timeout)
            }
            None => Self::template_only(),
        })
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Probe the provider once. Template-only generators are always ready.
    pub async fn check_provider(&self) -> bool {
        let Some(provider) = &self.provider else {
            return true;
        };

        match provider.health_check().await {
            Ok(true) => {
                info!("Commentary provider '{}' is healthy", provider.name());
                true
            }
            Ok(false) => {
                warn!(
                    "Commentary provider '{}' health check failed, templates will be used when it is down",
                    provider.name()
                );
                false
            }
            Err(e) => {
                warn!("Commentary provider '{}' error: {}", provider.name(), e);
                false
            }
        }
    }

    /// Template narrative and summary over the top moments.
    pub fn fallback_highlights(&self, result: &MatchResult, moments: Vec<GameMoment>) -> GameHighlights {
        GameHighlights {
            moments: select_top_moments(moments),
            narrative: fallback_narrative(result),
            summary: fallback_summary(result),
            source: CommentarySource::Template,
        }
    }

    /// Ask the provider for prose, falling back to templates on any failure.
    pub async fn generate_highlights(&self, result: &MatchResult, moments: Vec<GameMoment>) -> GameHighlights {
        let Some(provider) = &self.provider else {
            return self.fallback_highlights(result, moments);
        };

        let moments = select_top_moments(moments);
        match self.request_commentary(provider.as_ref(), result, &moments).await {
            Ok(parsed) => {
                debug!(
                    "{} rewrote {} of {} moments",
                    provider.name(),
                    parsed.moments.len(),
                    moments.len()
                );
                GameHighlights {
                    moments: parsed.apply(moments),
                    narrative: parsed.narrative,
                    summary: parsed.summary,
                    source: CommentarySource::Provider,
                }
            }
            Err(e) => {
                warn!("Commentary from {} failed, using templates: {}", provider.name(), e);
                self.fallback_highlights(result, moments)
            }
        }
    }

    async fn request_commentary(
        &self,
        provider: &dyn CommentaryProvider,
        result: &MatchResult,
        moments: &[GameMoment],
    ) -> Result<ParsedCommentary, CommentaryError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(result, moments)),
        ])
        .with_temperature(0.7)
        .with_max_tokens(800);

        let response = tokio::time::timeout(self.timeout, provider.chat(request))
            .await
            .map_err(|_| CommentaryError::Timeout(self.timeout.as_secs()))??;

        parse_response(&response.content)
    }
}

/// Keep the most important moments, earlier first among equals, then
/// restore game order.
pub fn select_top_moments(moments: Vec<GameMoment>) -> Vec<GameMoment> {
    let mut ranked = moments;
    ranked.sort_by_key(|m| (Reverse(m.importance.rank()), m.chronological_key()));
    ranked.truncate(MAX_MOMENTS);
    ranked.sort_by_key(|m| m.chronological_key());
    ranked
}

pub fn fallback_narrative(result: &MatchResult) -> String {
    let winner = &result.winning_team().name;
    let loser = &result.losing_team().name;
    let (high, low) = final_score(result);
    let margin = result.margin();

    let mut narrative = if margin <= NAIL_BITER_MARGIN {
        format!(
            "{} edged {} {}-{} in a nail-biter. Neither side could pull away, and it came down to the final possessions.",
            winner, loser, high, low
        )
    } else if margin <= CONTROLLED_MARGIN {
        format!(
            "{} controlled the game against {} and won {}-{}. They built a steady lead and never let it slip.",
            winner, loser, high, low
        )
    } else {
        format!(
            "{} dominated {} from start to finish in a {}-{} rout. The outcome was never in doubt.",
            winner, loser, high, low
        )
    };

    match result.overtime_periods() {
        0 => {}
        1 => narrative.push_str(" It took an extra period to settle."),
        n => narrative.push_str(&format!(" It took {} extra periods to settle.", n)),
    }

    narrative
}

pub fn fallback_summary(result: &MatchResult) -> String {
    let (high, low) = final_score(result);
    format!(
        "{} beat {} {}-{}. {} led the way with {} points.",
        result.winning_team().name,
        result.losing_team().name,
        high,
        low,
        result.mvp.player_name,
        result.mvp.points
    )
}

fn final_score(result: &MatchResult) -> (u32, u32) {
    let winner = result.score(result.winner);
    let loser = result.score(result.winner.opponent());
    (winner, loser)
}

const SYSTEM_PROMPT: &str = "You are an energetic basketball play-by-play commentator. \
Answer only with the requested lines, no preamble.";

/// Prompt listing the score, MVP and numbered moments.
pub fn build_prompt(result: &MatchResult, moments: &[GameMoment]) -> String {
    let mut prompt = format!(
        "Final score: {} {} - {} {}",
        result.team1.name, result.team1_score, result.team2_score, result.team2.name
    );
    if result.overtime_periods() > 0 {
        prompt.push_str(&format!(" ({} OT)", result.overtime_periods()));
    }
    prompt.push_str(&format!("\nMVP: {}\n", result.mvp.stat_line()));

    if moments.is_empty() {
        prompt.push_str("No key moments were detected.\n");
    } else {
        prompt.push_str("Key moments:\n");
        for (i, moment) in moments.iter().enumerate() {
            prompt.push_str(&format!(
                "MOMENT {}: Q{} {} [{}] {}\n",
                i + 1,
                moment.quarter,
                moment.clock,
                moment.moment_type,
                moment.description
            ));
        }
    }

    prompt.push_str(
        "\nRewrite each moment as one vivid sentence on its own line starting with \"MOMENT n:\". \
Then write a line starting with \"NARRATIVE:\" telling the story of the game in 2-3 sentences, \
and a line starting with \"SUMMARY:\" recapping the result in 1-2 sentences.",
    );
    prompt
}

/// Sections extracted from a provider reply.
#[derive(Debug, Clone, PartialEq)]
struct ParsedCommentary {
    /// 1-based moment number to rewritten description
    moments: HashMap<usize, String>,
    narrative: String,
    summary: String,
}

impl ParsedCommentary {
    fn apply(&self, mut moments: Vec<GameMoment>) -> Vec<GameMoment> {
        for (n, text) in &self.moments {
            if let Some(moment) = n.checked_sub(1).and_then(|i| moments.get_mut(i)) {
                moment.description = text.clone();
            }
        }
        moments
    }
}

fn parse_response(content: &str) -> Result<ParsedCommentary, CommentaryError> {
    if content.trim().is_empty() {
        return Err(CommentaryError::ResponseParseError("empty response".to_string()));
    }

    let mut moments = HashMap::new();
    let mut narrative = None;
    let mut summary = None;

    for line in content.lines() {
        let Some(caps) = SECTION_LINE.captures(line) else {
            continue;
        };
        let text = caps[3].to_string();

        if let Some(number) = caps.get(2) {
            if let Ok(n) = number.as_str().parse::<usize>() {
                moments.insert(n, text);
            }
        } else if caps[1].eq_ignore_ascii_case("narrative") {
            narrative = Some(text);
        } else {
            summary = Some(text);
        }
    }

    Ok(ParsedCommentary {
        moments,
        narrative: narrative.ok_or(CommentaryError::MissingSection("NARRATIVE"))?,
        summary: summary.ok_or(CommentaryError::MissingSection("SUMMARY"))?,
    })
}
