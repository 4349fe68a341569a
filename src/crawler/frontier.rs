//! Crawl-scoped queue and sets
//!
//! [`Frontier`] is the FIFO of pages waiting to be visited together with the
//! set of pages already visited. [`RootSet`] records matched root pages in
//! discovery order. Both live for exactly one crawl.

use std::collections::{HashSet, VecDeque};

/// BFS frontier with a visit budget
///
/// A URL is marked visited when it is dequeued, before the page is loaded,
/// so every URL is handed out at most once even if loading it fails.
#[derive(Debug, Clone)]
pub struct Frontier {
    /// URLs waiting to be visited, in BFS order
    queue: VecDeque<String>,

    /// URLs currently in `queue`
    queued: HashSet<String>,

    /// URLs already handed out
    visited: HashSet<String>,

    /// Maximum number of URLs ever handed out
    max_pages: usize,
}

impl Frontier {
    /// Creates a frontier seeded with `seeds` in order
    ///
    /// # Arguments
    ///
    /// * `seeds` - Entry points of the crawl
    /// * `max_pages` - Visit budget
    pub fn new<I, S>(seeds: I, max_pages: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_pages,
        };
        for seed in seeds {
            frontier.push(seed.into());
        }
        frontier
    }

    /// Enqueues a URL unless it was already visited or is already waiting
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn push(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Hands out the next unvisited URL and marks it visited
    ///
    /// Returns `None` once the queue is drained or the visit budget is spent.
    pub fn next_url(&mut self) -> Option<String> {
        while self.visited.len() < self.max_pages {
            let url = self.queue.pop_front()?;
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Root pages found during one crawl, in discovery order
#[derive(Debug, Clone, Default)]
pub struct RootSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root; returns `false` if it was already present
    pub fn insert(&mut self, url: &str) -> bool {
        if self.members.contains(url) {
            return false;
        }
        self.members.insert(url.to_string());
        self.order.push(url.to_string());
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Roots in the order they were found
    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}
