use crate::client::UtilitySyncClient;
use crate::domain::UserAction;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, instrument, warn};

/// Feeds user actions typed on `input` to the client until `quit` or the end of the input.
#[instrument(skip_all)]
pub async fn run<R>(input: R, client: &UtilitySyncClient) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let action = match line.parse::<UserAction>() {
            Ok(action) => action,
            Err(e) => {
                warn!(input = line, "⚠️ {}", e);
                continue;
            }
        };

        if action == UserAction::Quit {
            info!("👋 Quit requested");
            return Ok(());
        }

        match client.handle(action).await {
            Ok(true) => {}
            Ok(false) => warn!(input = line, "📪 Device not connected, command dropped"),
            Err(e) => warn!(input = line, "⚠️ {}", e),
        }
    }

    info!("👋 Input closed");
    Ok(())
}
