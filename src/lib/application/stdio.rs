use crate::application::chatbot::ChatBot;
use crate::config::TransportKind;
use crate::model::ModelProvider;
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

enum LoopControl {
    Continue,
    Exit,
}

/// Interactive chat on the process's stdin/stdout.
pub async fn run<P: ModelProvider>(
    bot: &mut ChatBot<P>,
    transport: TransportKind,
) -> Result<(), StdioError> {
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    run_with_io(bot, transport, stdin, &mut stdout).await
}

/// Line-oriented loop over arbitrary input and output. `quit` or `exit`
/// (any case) and end of input stop it; blank lines are ignored.
pub async fn run_with_io<P, R, W>(
    bot: &mut ChatBot<P>,
    transport: TransportKind,
    input: R,
    output: &mut W,
) -> Result<(), StdioError>
where
    P: ModelProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    print_banner(output, transport).await?;

    loop {
        prompt(output).await?;
        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed, leaving chat loop");
            write_line(output, "").await?;
            break;
        };

        match handle_line(bot, line.trim(), output).await? {
            LoopControl::Continue => continue,
            LoopControl::Exit => break,
        }
    }

    output.flush().await?;
    info!(
        conversation = bot.conversation_id(),
        turns = bot.transcript().len(),
        "chat loop finished"
    );
    Ok(())
}

async fn handle_line<P, W>(
    bot: &mut ChatBot<P>,
    input: &str,
    output: &mut W,
) -> Result<LoopControl, StdioError>
where
    P: ModelProvider,
    W: AsyncWrite + Unpin,
{
    if input.is_empty() {
        return Ok(LoopControl::Continue);
    }
    if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
        return Ok(LoopControl::Exit);
    }

    let answer = bot.chat(input).await;
    write_line(output, &format!("Bot: {answer}")).await?;
    write_line(output, "").await?;
    Ok(LoopControl::Continue)
}

async fn print_banner<W: AsyncWrite + Unpin>(
    output: &mut W,
    transport: TransportKind,
) -> io::Result<()> {
    write_line(output, &format!("MCP ChatBot Ready! ({transport} transport)")).await?;
    write_line(output, "Type 'quit' to exit").await?;
    write_line(output, "").await
}

async fn prompt<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    output.write_all(b"You: ").await?;
    output.flush().await
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}
