//! Line-delimited JSON-RPC MCP transport (spec.md §4.6): reads one request
//! per line from standard input, writes one reply per line to standard
//! output, and sends all diagnostics to standard error. The session is
//! implicit and spans the process lifetime; the loop exits on EOF.

#![forbid(unsafe_code)]

use std::sync::Arc;

use gw_mcp::Dispatcher;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// The session id STDIO callers are attributed under for audit purposes
/// (spec.md §3: "STDIO sessions are implicit and process-lifetime-scoped").
const STDIO_SESSION: &str = "stdio";

/// Run the STDIO transport against real process standard streams until
/// EOF on stdin.
pub async fn run(dispatcher: Arc<Dispatcher>) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    serve(dispatcher, stdin, stdout).await;
}

/// Run the read-dispatch-write loop over arbitrary streams, so the
/// transport can be exercised without real process I/O.
pub async fn serve<R, W>(dispatcher: Arc<Dispatcher>, input: R, mut output: W)
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::error!(%error, "failed reading stdin line");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = handle_line(&dispatcher, &line).await {
            if write_line(&mut output, &reply).await.is_err() {
                break;
            }
        }
    }
}

async fn handle_line(dispatcher: &Dispatcher, line: &str) -> Option<String> {
    let request: gw_mcp::JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(%error, "dropping unparsable JSON-RPC line");
            let body = serde_json::json!({
                "jsonrpc": "2.0",
                "id": serde_json::Value::Null,
                "error": { "code": -32700, "message": "parse error" },
            });
            return Some(body.to_string());
        }
    };
    let reply = dispatcher.dispatch(STDIO_SESSION, request).await;
    reply.into_json().map(|value| value.to_string())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> std::io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
