//! Command-line mailer
//!
//! Composes a single message from the command line and sends it through the
//! relay described by a TOML profile, or prints it with `--dry-run`.

use std::{io::Write, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use empath_mailer::{internal, Message, ProfileConfig};

/// Compose a MIME message and send it through an SMTP relay
#[derive(Parser, Debug)]
#[command(name = "empath-mailer")]
#[command(about = "Compose a MIME message and send it through an SMTP relay", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the relay profile (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Sender mailbox
    #[arg(short, long)]
    from: String,

    /// Primary recipients, may be repeated or comma separated
    #[arg(short, long, required = true)]
    to: Vec<String>,

    /// Carbon-copy recipients
    #[arg(long)]
    cc: Vec<String>,

    /// Blind carbon-copy recipients
    #[arg(long)]
    bcc: Vec<String>,

    /// Reply-To mailbox
    #[arg(long)]
    reply_to: Option<String>,

    /// Subject line
    #[arg(short, long, default_value = "")]
    subject: String,

    /// Message body
    #[arg(short, long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the message body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Send the body as text/html
    #[arg(long)]
    html: bool,

    /// Extra header as KEY:VALUE, may be repeated
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// File to attach, may be repeated
    #[arg(short, long)]
    attach: Vec<PathBuf>,

    /// Print the message instead of sending it
    #[arg(long)]
    dry_run: bool,
}

fn parse_header(value: &str) -> Result<(String, String), String> {
    let (key, value) = value
        .split_once(':')
        .ok_or_else(|| format!("expected KEY:VALUE, got '{value}'"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err("header name must not be empty".to_string());
    }
    if key.contains(['\r', '\n']) || value.contains(['\r', '\n']) {
        return Err("header must not contain CR or LF".to_string());
    }

    Ok((key.to_string(), value.trim().to_string()))
}

fn compose(message: &mut Message<'_>, cli: &Cli) -> anyhow::Result<()> {
    message.set_from(&cli.from)?;
    for to in &cli.to {
        message.add_to(to)?;
    }
    for cc in &cli.cc {
        message.add_cc(cc)?;
    }
    for bcc in &cli.bcc {
        message.add_bcc(bcc)?;
    }
    if let Some(reply_to) = &cli.reply_to {
        message.set_reply_to(reply_to)?;
    }
    for (key, value) in &cli.headers {
        message.add_header(key.as_str(), value.as_str())?;
    }
    for path in &cli.attach {
        message.attach(path);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    empath_mailer::logging::init();

    let cli = Cli::parse();

    let profile = ProfileConfig::from_file(&cli.config)?.into_profile()?;

    let body = match (&cli.body, &cli.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read body from {}", path.display()))?,
        (None, None) => String::new(),
    };

    let mut message = if cli.html {
        profile.new_html_message(cli.subject.as_str(), body)
    } else {
        profile.new_message(cli.subject.as_str(), body)
    };
    compose(&mut message, &cli)?;

    if cli.dry_run {
        let data = message.to_bytes()?;
        std::io::stdout()
            .write_all(&data)
            .context("Unable to write message")?;
        return Ok(());
    }

    message.send()?;
    internal!(
        level = INFO,
        "Sent message to {} recipient(s) via {}",
        message.envelope_recipients().len(),
        profile.address()
    );

    Ok(())
}
