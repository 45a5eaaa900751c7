//! Newline-delimited JSON framing over an async byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use panelbridge_core::link::{encode_command, parse_input_line, DeviceCommand, DeviceInput};

use crate::error::{LinkError, LinkResult};

/// Move frames between `stream` and the bridge until the stream ends,
/// shutdown is signalled, or the input consumer goes away.
///
/// Returns `Ok(())` on shutdown or when `inputs` is closed and
/// [`LinkError::Closed`] when the panel side hangs up.
pub async fn pump<S>(
    stream: S,
    inputs: &mpsc::Sender<DeviceInput>,
    outgoing: &mut mpsc::UnboundedReceiver<DeviceCommand>,
    shutdown: &mut watch::Receiver<bool>,
) -> LinkResult<()>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => {
                if read? == 0 {
                    return Err(LinkError::Closed);
                }
                // Panels may print non-UTF-8 garbage while resetting
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();

                if let Some(input) = parse_input_line(&line) {
                    debug!(input = %input.user_input, "Panel input received");
                    if inputs.send(input).await.is_err() {
                        debug!("Input consumer gone, stopping link");
                        return Ok(());
                    }
                }
            }
            Some(command) = outgoing.recv() => {
                let frame = encode_command(&command)?;
                writer.write_all(frame.as_bytes()).await?;
                writer.flush().await?;
                debug!(cmd = %command.cmd, value = %command.value, "Frame sent to panel");
            }
            _ = shutdown.changed() => return Ok(()),
        }
    }
}
