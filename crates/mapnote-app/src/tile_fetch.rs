//! Basemap tile downloads.
//!
//! Native builds fetch on worker threads and hand bytes back over a channel;
//! the browser build uses `fetch` futures that push into a thread-local
//! queue. Either way results are drained once per frame on the UI thread.

use mapnote_core::{TileId, TileSource};
use std::collections::HashSet;

/// Concurrent downloads allowed at once.
const MAX_IN_FLIGHT: usize = 8;

/// Outcome of one download.
#[derive(Debug)]
pub struct TileResponse {
    pub id: TileId,
    pub bytes: Result<Vec<u8>, String>,
}

pub struct TileFetcher {
    in_flight: HashSet<TileId>,
    max_in_flight: usize,
    #[cfg(not(target_arch = "wasm32"))]
    sender: std::sync::mpsc::Sender<TileResponse>,
    #[cfg(not(target_arch = "wasm32"))]
    receiver: std::sync::mpsc::Receiver<TileResponse>,
}

impl Default for TileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TileFetcher {
    pub fn new() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let (sender, receiver) = std::sync::mpsc::channel();
        Self {
            in_flight: HashSet::new(),
            max_in_flight: MAX_IN_FLIGHT,
            #[cfg(not(target_arch = "wasm32"))]
            sender,
            #[cfg(not(target_arch = "wasm32"))]
            receiver,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start downloads for `tiles` that are not already on their way.
    pub fn request(&mut self, source: &TileSource, tiles: &[TileId]) {
        for id in self.admit(tiles) {
            let url = source.url(id);
            log::debug!("Fetching tile {} from {}", id, url);
            self.spawn(id, url);
        }
    }

    /// Mark as many new tiles in flight as the concurrency cap allows.
    fn admit(&mut self, tiles: &[TileId]) -> Vec<TileId> {
        let mut admitted = Vec::new();
        for &id in tiles {
            if self.in_flight.len() >= self.max_in_flight {
                break;
            }
            if self.in_flight.insert(id) {
                admitted.push(id);
            }
        }
        admitted
    }

    /// Collect finished downloads.
    pub fn drain(&mut self) -> Vec<TileResponse> {
        let done = self.take_completed();
        for response in &done {
            self.in_flight.remove(&response.id);
        }
        done
    }

    #[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
    fn spawn(&self, id: TileId, url: String) {
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let bytes = native::fetch_bytes(&url).map_err(|e| e.to_string());
            // The receiver is gone only when the app is shutting down
            let _ = sender.send(TileResponse { id, bytes });
        });
    }

    #[cfg(all(not(target_arch = "wasm32"), not(feature = "native")))]
    fn spawn(&self, id: TileId, _url: String) {
        let _ = self.sender.send(TileResponse {
            id,
            bytes: Err("tile fetching needs the `native` feature".to_string()),
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn take_completed(&mut self) -> Vec<TileResponse> {
        self.receiver.try_iter().collect()
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, id: TileId, url: String) {
        wasm_bindgen_futures::spawn_local(async move {
            let bytes = web::fetch_bytes(&url)
                .await
                .map_err(|e| format!("{:?}", e));
            web::COMPLETED.with(|queue| queue.borrow_mut().push(TileResponse { id, bytes }));
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn take_completed(&mut self) -> Vec<TileResponse> {
        web::COMPLETED.with(|queue| std::mem::take(&mut *queue.borrow_mut()))
    }
}

#[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
mod native {
    const USER_AGENT: &str = concat!("mapnote/", env!("CARGO_PKG_VERSION"));

    pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, ureq::Error> {
        let mut response = ureq::get(url).header("User-Agent", USER_AGENT).call()?;
        response.body_mut().read_to_vec()
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::TileResponse;
    use std::cell::RefCell;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    thread_local! {
        pub static COMPLETED: RefCell<Vec<TileResponse>> = const { RefCell::new(Vec::new()) };
    }

    pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        let buffer = JsFuture::from(response.array_buffer()?).await?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_skips_in_flight() {
        let mut fetcher = TileFetcher::new();
        let a = TileId::new(3, 1, 2);
        let b = TileId::new(3, 2, 2);
        assert_eq!(fetcher.admit(&[a, b]), vec![a, b]);
        assert_eq!(fetcher.admit(&[a, b]), Vec::<TileId>::new());
        assert_eq!(fetcher.in_flight(), 2);
    }

    #[test]
    fn test_admit_respects_cap() {
        let mut fetcher = TileFetcher::new();
        let tiles: Vec<TileId> = (0..20).map(|x| TileId::new(5, x, 0)).collect();
        assert_eq!(fetcher.admit(&tiles).len(), MAX_IN_FLIGHT);
        assert!(fetcher.admit(&tiles).is_empty());
    }

    #[test]
    fn test_drain_releases_slots() {
        let mut fetcher = TileFetcher::new();
        let id = TileId::new(1, 0, 0);
        fetcher.admit(&[id]);
        fetcher
            .sender
            .send(TileResponse { id, bytes: Err("offline".to_string()) })
            .unwrap();

        let done = fetcher.drain();
        assert_eq!(done.len(), 1);
        assert!(done[0].bytes.is_err());
        assert_eq!(fetcher.in_flight(), 0);
        assert!(fetcher.drain().is_empty());
    }
}
