//! `reskill mentor`: an interactive chat on stdin.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use reskill_core::Generator;
use reskill_core::mentor::MentorChat;

use crate::app::App;

const QUIT_COMMANDS: [&str; 2] = ["/sair", "/exit"];

pub async fn cmd_mentor(app: &App) -> Result<()> {
    let generator = app.generator()?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_chat(&generator, stdin, &mut stdout).await?;
    Ok(())
}

/// Read user lines from `input` until EOF or a quit command, writing the
/// transcript to `out`. Returns the number of messages sent.
pub async fn run_chat<R, W>(generator: &dyn Generator, input: R, out: &mut W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut chat = MentorChat::new();
    if let Some(welcome) = chat.messages().first() {
        writeln!(out, "Mentor: {}", welcome.text)?;
    }
    writeln!(out, "(type /sair to leave)")?;

    let mut lines = input.lines();
    let mut sent = 0;
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        if QUIT_COMMANDS.contains(&line) {
            break;
        }
        if let Some(reply) = chat.send(generator, line).await {
            writeln!(out, "Mentor: {}", reply.text)?;
            sent += 1;
        }
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reskill_core::mentor::{APOLOGY_MESSAGE, WELCOME_MESSAGE};
    use reskill_test_utils::ScriptedGenerator;

    #[tokio::test]
    async fn chat_until_quit() {
        let generator = ScriptedGenerator::with_replies(["  Comece por HTML.  "]);
        let input: &[u8] = b"quero ser dev\n\n   \n/sair\nignorado\n";
        let mut out = Vec::new();

        let sent = run_chat(&generator, input, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(sent, 1);
        assert!(text.starts_with(&format!("Mentor: {WELCOME_MESSAGE}\n")));
        assert!(text.contains("Mentor: Comece por HTML.\n"));
        assert_eq!(generator.prompts().len(), 1);
        assert!(generator.prompts()[0].contains("Pessoa: quero ser dev"));
    }

    #[tokio::test]
    async fn failed_reply_shows_apology_and_continues() {
        let generator = ScriptedGenerator::new();
        generator.push_status(503, "overloaded");
        generator.push_ok("Tudo certo agora.");
        let input: &[u8] = b"oi\noi de novo\n";
        let mut out = Vec::new();

        let sent = run_chat(&generator, input, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(sent, 2);
        assert!(text.contains(&format!("Mentor: {APOLOGY_MESSAGE}\n")));
        assert!(text.contains("Mentor: Tudo certo agora.\n"));
        assert!(text.ends_with("> \n"));
    }
}
