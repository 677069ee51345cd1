use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use webmap_shared::{ChunkMeta, ChunkMetaEntry, ChunkPos, MapSource, RegionPos};

/// Receives "something new can be drawn" notifications from the caches.
pub trait RedrawObserver {
    fn request_redraw(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed,
}

/// Completion handle for one image load. Consuming `settle` makes the
/// loading -> ready/failed transition and its redraw happen exactly once.
pub struct LoadTicket {
    state: Rc<Cell<LoadState>>,
    observer: Rc<dyn RedrawObserver>,
}

impl LoadTicket {
    pub fn settle(self, ok: bool) {
        self.state
            .set(if ok { LoadState::Ready } else { LoadState::Failed });
        self.observer.request_redraw();
    }
}

/// Starts image downloads. Implementations call `ticket.settle` when the load finishes.
pub trait ImageLoader {
    type Image: Clone;

    /// `None` if no image handle could be created; the ticket must still be settled.
    fn load(&self, url: &str, ticket: LoadTicket) -> Option<Self::Image>;
}

#[derive(Clone)]
pub struct CachedImage<I> {
    image: Option<I>,
    state: Rc<Cell<LoadState>>,
}

impl<I> CachedImage<I> {
    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    /// The image, if it finished loading successfully.
    pub fn ready(&self) -> Option<&I> {
        match self.state.get() {
            LoadState::Ready => self.image.as_ref(),
            LoadState::Loading | LoadState::Failed => None,
        }
    }
}

/// Session-lifetime image cache keyed by request URL. Entries are never evicted.
pub struct ImageCache<L: ImageLoader> {
    loader: L,
    observer: Rc<dyn RedrawObserver>,
    entries: RefCell<HashMap<String, CachedImage<L::Image>>>,
}

impl<L: ImageLoader> ImageCache<L> {
    pub fn new(loader: L, observer: Rc<dyn RedrawObserver>) -> Self {
        Self {
            loader,
            observer,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Look up `key`. A miss starts a load only when `allow_load` is set; probes with
    /// `allow_load == false` never cause network work.
    pub fn get(&self, key: &str, allow_load: bool) -> Option<CachedImage<L::Image>> {
        if let Some(entry) = self.entries.borrow().get(key) {
            return Some(entry.clone());
        }
        if !allow_load {
            return None;
        }

        let state = Rc::new(Cell::new(LoadState::Loading));
        let ticket = LoadTicket {
            state: state.clone(),
            observer: self.observer.clone(),
        };
        // The loader may settle synchronously, so no borrow is held across it.
        let image = self.loader.load(key, ticket);
        let entry = CachedImage { image, state };
        self.entries
            .borrow_mut()
            .insert(key.to_string(), entry.clone());
        Some(entry)
    }

    /// The image under `key` if it is loaded, starting a load on a miss.
    pub fn load_ready(&self, key: &str) -> Option<L::Image> {
        self.get(key, true)
            .and_then(|entry| entry.ready().cloned())
    }

    /// The image under `key` if it is loaded, without starting a load.
    pub fn probe_ready(&self, key: &str) -> Option<L::Image> {
        self.get(key, false)
            .and_then(|entry| entry.ready().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Fetches one chunk-metadata region and answers through the reply.
pub trait RegionFetcher {
    fn fetch(&self, url: String, reply: RegionReply);
}

#[derive(Default)]
struct SourceChunks {
    requested: HashSet<RegionPos>,
    chunks: HashMap<ChunkPos, ChunkMeta>,
}

type ChunkStore = Rc<RefCell<HashMap<MapSource, SourceChunks>>>;

/// Delivers a fetched region into the chunk cache. Either way the fetch completes, one
/// redraw is requested.
pub struct RegionReply {
    store: ChunkStore,
    source: MapSource,
    observer: Rc<dyn RedrawObserver>,
}

impl RegionReply {
    pub fn deliver(self, entries: Vec<ChunkMetaEntry>) {
        {
            let mut store = self.store.borrow_mut();
            let chunks = &mut store.entry(self.source).or_default().chunks;
            for entry in entries {
                chunks.insert(ChunkPos::new(entry.x, entry.z), entry.meta);
            }
        }
        self.observer.request_redraw();
    }

    /// The region stays marked as requested; it is not retried.
    pub fn fail(self) {
        self.observer.request_redraw();
    }
}

/// Per-chunk metadata, fetched a 16x16-chunk region at a time and at most once per region.
pub struct ChunkMetaCache<F: RegionFetcher> {
    fetcher: F,
    observer: Rc<dyn RedrawObserver>,
    store: ChunkStore,
}

impl<F: RegionFetcher> ChunkMetaCache<F> {
    pub fn new(fetcher: F, observer: Rc<dyn RedrawObserver>) -> Self {
        Self {
            fetcher,
            observer,
            store: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Metadata for `chunk`, or empty metadata if its region has not arrived. Never blocks;
    /// the first lookup in a region starts that region's fetch.
    pub fn lookup(&self, source: &MapSource, chunk: ChunkPos) -> ChunkMeta {
        let region = chunk.region();
        let (meta, needs_fetch) = {
            let mut store = self.store.borrow_mut();
            if !store.contains_key(source) {
                store.insert(source.clone(), SourceChunks::default());
            }
            match store.get_mut(source) {
                Some(entry) => (
                    entry.chunks.get(&chunk).cloned().unwrap_or_default(),
                    entry.requested.insert(region),
                ),
                None => (ChunkMeta::default(), false),
            }
        };

        if needs_fetch {
            self.fetcher.fetch(
                source.chunk_meta_path(region),
                RegionReply {
                    store: self.store.clone(),
                    source: source.clone(),
                    observer: self.observer.clone(),
                },
            );
        }
        meta
    }

    pub fn requested_regions(&self, source: &MapSource) -> usize {
        self.store
            .borrow()
            .get(source)
            .map_or(0, |entry| entry.requested.len())
    }
}
