//! Recording doubles for the surface and the diagnostic prober, plus a
//! loopback HTTP server with canned responses.
//!
//! Every operation is stored with the virtual time it happened at, measured
//! from the recorder's creation, so paused-clock tests can assert exact
//! timings.

use crate::fetch::Prober;
use crate::preloader::PreloaderAsset;
use crate::surface::{Content, Notice, Signal, SlideListener, Surface};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Title(String),
    Preload(PreloaderAsset),
    ShowOverlay(PreloaderAsset),
    HideOverlay,
    Clear,
    Mount { generation: u64, content: Content },
    Notice(Notice),
    Prompt(String),
    RemovePrompt,
    Resume { unmute: bool },
}

#[derive(Debug)]
struct Inner {
    start: Instant,
    ops: Vec<(Duration, Op)>,
    probes: Vec<String>,
    listeners: HashMap<u64, SlideListener>,
}

#[derive(Debug, Clone)]
pub struct Recorder {
    inner: Arc<Mutex<Inner>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                start: Instant::now(),
                ops: Vec::new(),
                probes: Vec::new(),
                listeners: HashMap::new(),
            })),
        }
    }

    pub fn surface(&self) -> RecordingSurface {
        RecordingSurface(self.clone())
    }

    pub fn prober(&self) -> Arc<dyn Prober> {
        Arc::new(RecordingProber(self.clone()))
    }

    fn push(&self, op: Op) {
        let mut inner = self.inner.lock().unwrap();
        let at = Instant::now() - inner.start;
        inner.ops.push((at, op));
    }

    pub fn reset(&self) {
        self.inner.lock().unwrap().ops.clear();
    }

    pub fn ops(&self) -> Vec<(Duration, Op)> {
        self.inner.lock().unwrap().ops.clone()
    }

    pub fn op_list(&self) -> Vec<Op> {
        self.ops().into_iter().map(|(_, op)| op).collect()
    }

    /// `(time, generation, content)` of every mount.
    pub fn mounts(&self) -> Vec<(Duration, u64, Content)> {
        self.ops()
            .into_iter()
            .filter_map(|(at, op)| match op {
                Op::Mount {
                    generation,
                    content,
                } => Some((at, generation, content)),
                _ => None,
            })
            .collect()
    }

    pub fn probes(&self) -> Vec<String> {
        self.inner.lock().unwrap().probes.clone()
    }

    /// Deliver `signal` as if the content of slide `generation` raised it.
    pub fn emit(&self, generation: u64, signal: Signal) {
        let listener = self
            .inner
            .lock()
            .unwrap()
            .listeners
            .get(&generation)
            .cloned()
            .unwrap_or_else(|| panic!("no listener for generation {}", generation));
        listener.emit(signal);
    }
}

pub struct RecordingSurface(Recorder);

impl Surface for RecordingSurface {
    fn set_title(&mut self, title: &str) {
        self.0.push(Op::Title(title.to_string()));
    }

    fn preload(&mut self, asset: &PreloaderAsset) {
        self.0.push(Op::Preload(asset.clone()));
    }

    fn mount_overlay(&mut self, asset: &PreloaderAsset) {
        self.0.push(Op::ShowOverlay(asset.clone()));
    }

    fn unmount_overlay(&mut self) {
        self.0.push(Op::HideOverlay);
    }

    fn clear(&mut self) {
        self.0.push(Op::Clear);
    }

    fn mount(&mut self, content: &Content, listener: SlideListener) {
        let generation = listener.generation();
        self.0
            .inner
            .lock()
            .unwrap()
            .listeners
            .insert(generation, listener);
        self.0.push(Op::Mount {
            generation,
            content: content.clone(),
        });
    }

    fn append_notice(&mut self, notice: &Notice) {
        self.0.push(Op::Notice(notice.clone()));
    }

    fn show_prompt(&mut self, notice: &Notice, _listener: SlideListener) {
        self.0.push(Op::Prompt(notice.text.clone()));
    }

    fn remove_prompt(&mut self) {
        self.0.push(Op::RemovePrompt);
    }

    fn resume_playback(&mut self, unmute: bool) {
        self.0.push(Op::Resume { unmute });
    }
}

pub struct RecordingProber(Recorder);

impl Prober for RecordingProber {
    fn probe(&self, src: &str) {
        self.0.inner.lock().unwrap().probes.push(src.to_string());
    }
}

/// Raw HTTP/1.1 response with a fixed body.
pub fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Answer every request on a loopback port with `response`. Returns the
/// base URL.
pub async fn serve(response: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let response = Arc::new(response);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let response = response.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request).await;
                let _ = stream.write_all(&response).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    base
}
