//! Interactive chat session on the terminal.

use anyhow::Result;
use chatline_core::{Conversation, Notice, Sender, TranscriptEntry};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    Attach(PathBuf),
    Detach,
    /// Voice an entry; the latest bot message when no index is given
    Speak(Option<usize>),
    Stop,
    Listen,
    /// Copy a whole message; the latest bot message when no index is given
    Copy(Option<usize>),
    CopyCode { entry: usize, block: usize },
    Export(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  /attach PATH         upload a file and attach it to the next message
  /detach              drop the current attachment
  /speak [N]           voice message N (default: latest reply)
  /stop                stop audio or speech
  /listen              dictate a message
  /copy [N]            copy message N (default: latest reply)
  /copy-code N B       copy code block B of message N
  /export PATH         save the transcript as an HTML page
  /help                show this help
  /quit                leave
Anything else is sent as a message.";

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Send(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "attach" if !arg.is_empty() => ReplCommand::Attach(PathBuf::from(arg)),
            "detach" => ReplCommand::Detach,
            "speak" => match parse_index(arg) {
                Ok(index) => ReplCommand::Speak(index),
                Err(()) => ReplCommand::Invalid(line.to_string()),
            },
            "stop" => ReplCommand::Stop,
            "listen" => ReplCommand::Listen,
            "copy" => match parse_index(arg) {
                Ok(index) => ReplCommand::Copy(index),
                Err(()) => ReplCommand::Invalid(line.to_string()),
            },
            "copy-code" => {
                let mut parts = arg.split_whitespace().map(str::parse::<usize>);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Ok(entry)), Some(Ok(block)), None) => {
                        ReplCommand::CopyCode { entry, block }
                    }
                    _ => ReplCommand::Invalid(line.to_string()),
                }
            }
            "export" if !arg.is_empty() => ReplCommand::Export(PathBuf::from(arg)),
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Invalid(line.to_string()),
        }
    }
}

fn parse_index(arg: &str) -> std::result::Result<Option<usize>, ()> {
    if arg.is_empty() {
        return Ok(None);
    }
    arg.parse().map(Some).map_err(|_| ())
}

/// Index of the most recent bot message.
fn latest_reply(conversation: &Conversation) -> Option<usize> {
    conversation
        .transcript()
        .entries()
        .iter()
        .rposition(|entry| entry.message.sender == Sender::Bot)
}

/// Terminal rendering of one transcript entry.
pub fn format_entry(index: usize, entry: &TranscriptEntry) -> String {
    let message = &entry.message;
    let mut out = format!(
        "[{}] {} {}: {}",
        index,
        message.timestamp.format("%H:%M:%S"),
        message.sender.label(),
        message.raw_text
    );
    for (block_index, block) in entry.rendered.code_blocks().iter().enumerate() {
        out.push_str(&format!("\n    (code {} {}: {})", index, block_index, block.language));
    }
    if message.audio_url.is_some() {
        out.push_str(&format!("\n    (audio: /speak {})", index));
    }
    out
}

fn print_notices(conversation: &mut Conversation) {
    for notice in conversation.take_notices() {
        match notice {
            Notice::Info(text) => println!("  {}", text),
            Notice::Alert(text) => eprintln!("! {}", text),
        }
    }
}

/// Print entries appended after the first `count`.
fn print_since(conversation: &Conversation, count: usize) {
    let entries = conversation.transcript().entries();
    for (index, entry) in entries.iter().enumerate().skip(count) {
        println!("{}", format_entry(index, entry));
    }
}

/// Run the session until `/quit` or end of input.
pub async fn run(conversation: &mut Conversation, autoplay: bool) -> Result<()> {
    print_since(conversation, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Send(text) => {
                let count = conversation.transcript().len();
                if conversation.send(&text).await.is_some() {
                    print_since(conversation, count);
                    let reply = conversation.transcript().len() - 1;
                    if autoplay {
                        if let Err(e) = conversation.play_entry(reply).await {
                            tracing::warn!("Autoplay failed: {}", e);
                        }
                    }
                }
            }
            ReplCommand::Attach(path) => {
                if let Some(file) = conversation.attach(&path).await {
                    tracing::debug!("Attached {} as {}", file.display_name, file.file_ref);
                }
            }
            ReplCommand::Detach => {
                if let Some(file) = conversation.detach() {
                    println!("  Detached {}", file.display_name);
                }
            }
            ReplCommand::Speak(index) => {
                if let Some(index) = index.or_else(|| latest_reply(conversation)) {
                    if let Err(e) = conversation.play_entry(index).await {
                        eprintln!("! {}", e);
                    }
                }
            }
            ReplCommand::Stop => conversation.stop_playback().await,
            ReplCommand::Listen => {
                let count = conversation.transcript().len();
                if conversation.listen().await.is_some() {
                    print_since(conversation, count);
                }
            }
            ReplCommand::Copy(index) => {
                if let Some(index) = index.or_else(|| latest_reply(conversation)) {
                    // Failures surface as notices
                    let _ = conversation.copy_message(index).await;
                }
            }
            ReplCommand::CopyCode { entry, block } => {
                let _ = conversation.copy_code(entry, block).await;
            }
            ReplCommand::Export(path) => {
                let html = conversation.transcript().to_html_document("Chat transcript");
                match tokio::fs::write(&path, html).await {
                    Ok(()) => println!("  Saved {}", path.display()),
                    Err(e) => eprintln!("! Failed to write {}: {}", path.display(), e),
                }
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => break,
            ReplCommand::Invalid(line) => eprintln!("! Unknown command: {} (try /help)", line),
        }

        print_notices(conversation);
    }

    conversation.stop_playback().await;
    Ok(())
}
