//! Interactive console input.
//!
//! `ConsoleDecisions` prompts a human for Hit/Stand and for the number of
//! rounds to play.  Input is line-based; anything unrecognised gets a short
//! hint and the question is asked again.  Reader and writer are generic so
//! tests can script a conversation.

use async_trait::async_trait;
use bj_core::Decision;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

use crate::application::{DecisionMaker, PlayerError, TableView};

/// Parses a Hit/Stand answer: `h`, `hit`, `s` or `stand`, any case.
pub fn parse_decision(input: &str) -> Option<Decision> {
    match input.trim().to_ascii_lowercase().as_str() {
        "h" | "hit" => Some(Decision::Hit),
        "s" | "stand" => Some(Decision::Stand),
        _ => None,
    }
}

/// Parses a round count in `1..=255`.
///
/// # Errors
///
/// Returns [`PlayerError::Input`] describing what was wrong.
pub fn parse_round_count(input: &str) -> Result<u8, PlayerError> {
    let trimmed = input.trim();
    let n: u32 = trimmed
        .parse()
        .map_err(|_| PlayerError::Input(format!("{trimmed:?} is not a number")))?;
    match u8::try_from(n) {
        Ok(rounds) if rounds >= 1 => Ok(rounds),
        _ => Err(PlayerError::Input(format!(
            "{n} is out of range, choose 1 to 255"
        ))),
    }
}

/// Human decisions read from a line-based console.
pub struct ConsoleDecisions<R, W> {
    lines: Lines<R>,
    out: W,
}

impl ConsoleDecisions<BufReader<Stdin>, Stdout> {
    /// Reads from standard input and prompts on standard output.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleDecisions<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    /// Asks until the user enters a valid round count.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::Input`] if input ends before a valid answer.
    pub async fn ask_rounds(&mut self) -> Result<u8, PlayerError> {
        loop {
            self.say("How many rounds would you like to play? ").await?;
            match parse_round_count(&self.read_line().await?) {
                Ok(rounds) => return Ok(rounds),
                Err(PlayerError::Input(why)) => self.say(&format!("{why}\n")).await?,
                Err(other) => return Err(other),
            }
        }
    }

    /// Consumes the console, returning its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    async fn read_line(&mut self) -> Result<String, PlayerError> {
        self.lines
            .next_line()
            .await?
            .ok_or_else(|| PlayerError::Input("input closed".to_string()))
    }

    async fn say(&mut self, text: &str) -> Result<(), PlayerError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> DecisionMaker for ConsoleDecisions<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn decide(&mut self, view: &TableView) -> Result<Decision, PlayerError> {
        let prompt = format!(
            "Your total is {} (dealer shows {}). Hit or stand? [h/s] ",
            view.hand.value(),
            view.dealer_upcard
        );
        loop {
            self.say(&prompt).await?;
            if let Some(decision) = parse_decision(&self.read_line().await?) {
                return Ok(decision);
            }
            self.say("Please type h/hit or s/stand.\n").await?;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
