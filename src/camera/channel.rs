// src/camera/channel.rs - Line-protocol channel to the PTZ daemon

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::camera::{
    AxisSpeeds, CameraError, MotionApi, Parameters, PtzLimits, PtzPosition, QueueInfo, QueueOp,
};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-connection command channel to the camera's PTZ daemon.
///
/// One command line out, one `ok ...` or `err ...` line back. Not
/// thread-safe; all calls must come from a single async task.
#[derive(Debug)]
pub struct CameraChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    video_channel: u32,
}

impl CameraChannel {
    pub async fn connect(host: &str, port: u16, video_channel: u32) -> Result<Self, CameraError> {
        tracing::info!("Connecting to PTZ daemon at {}:{}", host, port);
        let stream = TcpStream::connect((host, port)).await?;
        let (read_half, write_half) = stream.into_split();
        tracing::info!("Connected to PTZ daemon");
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            video_channel,
        })
    }

    async fn send_command(&mut self, command: &str) -> Result<String, CameraError> {
        tracing::debug!("PTZ <- {}", command);
        let line = format!("{}\n", command);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        let mut response = String::new();
        let n = timeout(COMMAND_TIMEOUT, self.reader.read_line(&mut response))
            .await
            .map_err(|_| CameraError::Timeout)??;
        if n == 0 {
            return Err(CameraError::NotConnected);
        }
        let response = response.trim();
        tracing::debug!("PTZ -> {}", response);

        if let Some(message) = response.strip_prefix("err") {
            return Err(CameraError::Rejected(message.trim().to_string()));
        }
        match response.strip_prefix("ok") {
            Some(payload) => Ok(payload.trim().to_string()),
            None => Err(CameraError::BadResponse(response.to_string())),
        }
    }
}

fn parse_ints(payload: &str, expect: usize) -> Result<Vec<i32>, CameraError> {
    let fields: Result<Vec<i32>, _> = payload.split_whitespace().map(str::parse).collect();
    match fields {
        Ok(fields) if fields.len() == expect => Ok(fields),
        _ => Err(CameraError::BadResponse(payload.to_string())),
    }
}

#[async_trait]
impl MotionApi for CameraChannel {
    async fn move_capabilities(&mut self) -> Result<Vec<String>, CameraError> {
        let payload = self.send_command(&format!("caps {}", self.video_channel)).await?;
        Ok(payload.split_whitespace().map(str::to_string).collect())
    }

    async fn is_moving(&mut self) -> Result<bool, CameraError> {
        let payload = self.send_command(&format!("moving {}", self.video_channel)).await?;
        match payload.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(CameraError::BadResponse(other.to_string())),
        }
    }

    async fn absolute_move(&mut self, target: PtzPosition, speed: f32) -> Result<(), CameraError> {
        self.send_command(&format!(
            "abs {} {} {} {} {:.4}",
            self.video_channel, target.pan, target.tilt, target.zoom, speed
        ))
        .await?;
        Ok(())
    }

    async fn continuous_move(
        &mut self,
        speeds: AxisSpeeds,
        timeout: Duration,
    ) -> Result<(), CameraError> {
        self.send_command(&format!(
            "cont {} {:.4} {:.4} {:.4} {}",
            self.video_channel,
            speeds.pan,
            speeds.tilt,
            speeds.zoom,
            timeout.as_secs()
        ))
        .await?;
        Ok(())
    }

    async fn stop_continuous(
        &mut self,
        stop_pan_tilt: bool,
        stop_zoom: bool,
    ) -> Result<(), CameraError> {
        self.send_command(&format!(
            "stop {} {} {}",
            self.video_channel, stop_pan_tilt as u8, stop_zoom as u8
        ))
        .await?;
        Ok(())
    }

    async fn status(&mut self) -> Result<PtzPosition, CameraError> {
        let payload = self.send_command(&format!("status {}", self.video_channel)).await?;
        let fields = parse_ints(&payload, 3)?;
        Ok(PtzPosition {
            pan: fields[0],
            tilt: fields[1],
            zoom: fields[2],
        })
    }

    async fn limits(&mut self) -> Result<PtzLimits, CameraError> {
        let payload = self.send_command(&format!("limits {}", self.video_channel)).await?;
        let fields = parse_ints(&payload, 6)?;
        Ok(PtzLimits {
            pan_min: fields[0],
            pan_max: fields[1],
            tilt_min: fields[2],
            tilt_max: fields[3],
            zoom_min: fields[4],
            zoom_max: fields[5],
        })
    }

    async fn list_presets(&mut self) -> Result<Vec<String>, CameraError> {
        let payload = self.send_command(&format!("presets {}", self.video_channel)).await?;
        Ok(payload.split_whitespace().map(str::to_string).collect())
    }

    async fn goto_preset(&mut self, index: u32, speed: f32) -> Result<(), CameraError> {
        self.send_command(&format!("goto {} {} {:.4}", self.video_channel, index, speed))
            .await?;
        Ok(())
    }

    async fn queue_request(&mut self, op: QueueOp) -> Result<QueueInfo, CameraError> {
        let verb = match op {
            QueueOp::Drop => "drop",
            QueueOp::Get => "get",
            QueueOp::QueryStatus => "query",
        };
        let payload = self
            .send_command(&format!("queue {} {}", self.video_channel, verb))
            .await?;
        let fields = parse_ints(&payload, 3)?;
        Ok(QueueInfo {
            queue_pos: fields[0],
            time_to_pos_one: fields[1],
            poll_time: fields[2],
        })
    }

    async fn reacquire_group(&mut self) -> Result<(), CameraError> {
        self.send_command(&format!("group {}", self.video_channel)).await?;
        Ok(())
    }
}

#[async_trait]
impl Parameters for CameraChannel {
    async fn get_parameter(&mut self, key: &str) -> Result<String, CameraError> {
        self.send_command(&format!("param get {}", key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    // Serves one connection, answering each request line with the next
    // scripted response.
    async fn scripted_daemon(responses: Vec<&'static str>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            for response in responses {
                if lines.next_line().await.unwrap().is_none() {
                    break;
                }
                write_half
                    .write_all(format!("{}\n", response).as_bytes())
                    .await
                    .unwrap();
            }
        });
        port
    }

    #[tokio::test]
    async fn status_parses_three_fields() {
        let port = scripted_daemon(vec!["ok 1200 -300 4000"]).await;
        let mut channel = CameraChannel::connect("127.0.0.1", port, 1).await.unwrap();
        let position = channel.status().await.unwrap();
        assert_eq!(
            position,
            PtzPosition {
                pan: 1200,
                tilt: -300,
                zoom: 4000
            }
        );
    }

    #[tokio::test]
    async fn err_line_is_a_rejection() {
        let port = scripted_daemon(vec!["err no such preset"]).await;
        let mut channel = CameraChannel::connect("127.0.0.1", port, 1).await.unwrap();
        let result = channel.goto_preset(99, 0.4).await;
        match result {
            Err(CameraError::Rejected(message)) => assert_eq!(message, "no such preset"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn short_status_is_malformed() {
        let port = scripted_daemon(vec!["ok 1200 -300"]).await;
        let mut channel = CameraChannel::connect("127.0.0.1", port, 1).await.unwrap();
        assert!(matches!(
            channel.status().await,
            Err(CameraError::BadResponse(_))
        ));
    }

    #[tokio::test]
    async fn absolute_move_is_accepted() {
        let port = scripted_daemon(vec!["ok"]).await;
        let mut channel = CameraChannel::connect("127.0.0.1", port, 1).await.unwrap();
        let target = PtzPosition {
            pan: -4000,
            tilt: 800,
            zoom: 12000,
        };
        assert!(channel.absolute_move(target, 0.4).await.is_ok());
    }

    #[tokio::test]
    async fn queue_request_reports_position() {
        let port = scripted_daemon(vec!["ok 1 0 5000"]).await;
        let mut channel = CameraChannel::connect("127.0.0.1", port, 1).await.unwrap();
        let info = channel.queue_request(QueueOp::Get).await.unwrap();
        assert_eq!(info.queue_pos, 1);
        assert_eq!(info.time_to_pos_one, 0);
        assert_eq!(info.poll_time, 5000);
    }
}
