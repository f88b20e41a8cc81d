//! Content buffers and the focus-carrying buffer stack.

use std::any::Any;
use std::fmt;

use maildeck_core::draft::Draft;

/// Stable handle for a buffer. Ids are assigned in opening order and never
/// reused within a session, so a held id stays meaningful after unrelated
/// buffers close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Search,
    BufferList,
    TagList,
    Envelope,
}

impl BufferKind {
    /// The command mode a focused buffer of this kind puts the UI in.
    #[must_use]
    pub fn mode(self) -> &'static str {
        match self {
            BufferKind::Search => "search",
            BufferKind::BufferList => "bufferlist",
            BufferKind::TagList => "taglist",
            BufferKind::Envelope => "envelope",
        }
    }
}

/// A content view. Concrete kinds carry their own view-model; the engine
/// reaches it through `as_any` when refreshing.
pub trait Buffer {
    fn kind(&self) -> BufferKind;
    fn title(&self) -> String;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// Concrete buffer kinds
// ---------------------------------------------------------------------------

/// Result listing for one query. The renderer re-runs the query whenever
/// `generation` changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBuffer {
    querystring: String,
    generation: u64,
}

impl SearchBuffer {
    #[must_use]
    pub fn new(querystring: &str) -> Self {
        Self {
            querystring: querystring.to_string(),
            generation: 0,
        }
    }

    #[must_use]
    pub fn querystring(&self) -> &str {
        &self.querystring
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bump_generation(&mut self) {
        self.generation += 1;
    }
}

impl Buffer for SearchBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::Search
    }

    fn title(&self) -> String {
        format!("search: {}", self.querystring)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Overview of the open buffers. `entries` is a snapshot taken by the
/// engine; `selected` is where the renderer put the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferListBuffer {
    entries: Vec<(BufferId, String)>,
    selected: Option<BufferId>,
}

impl BufferListBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[(BufferId, String)] {
        &self.entries
    }

    /// Replace the snapshot. The selection is kept if the selected buffer
    /// is still listed, otherwise it falls back to the first entry.
    pub fn set_entries(&mut self, entries: Vec<(BufferId, String)>) {
        let still_listed = self
            .selected
            .is_some_and(|id| entries.iter().any(|(entry, _)| *entry == id));
        if !still_listed {
            self.selected = entries.first().map(|(id, _)| *id);
        }
        self.entries = entries;
    }

    pub fn select(&mut self, id: BufferId) {
        self.selected = Some(id);
    }

    #[must_use]
    pub fn selected_buffer(&self) -> Option<BufferId> {
        self.selected
    }
}

impl Buffer for BufferListBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::BufferList
    }

    fn title(&self) -> String {
        "bufferlist".to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All tags known to the index, sorted for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagListBuffer {
    tags: Vec<String>,
}

impl TagListBuffer {
    #[must_use]
    pub fn new(mut tags: Vec<String>) -> Self {
        tags.sort();
        Self { tags }
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags(&mut self, mut tags: Vec<String>) {
        tags.sort();
        self.tags = tags;
    }
}

impl Buffer for TagListBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::TagList
    }

    fn title(&self) -> String {
        "taglist".to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A message under composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeBuffer {
    draft: Draft,
}

impl EnvelopeBuffer {
    #[must_use]
    pub fn new(draft: Draft) -> Self {
        Self { draft }
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }
}

impl Buffer for EnvelopeBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::Envelope
    }

    fn title(&self) -> String {
        match self.draft.get("To") {
            Some(to) => format!("to: {to}"),
            None => "envelope".to_string(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Buffer stack
// ---------------------------------------------------------------------------

/// Ordered collection of open buffers with a single focus. Order is
/// insertion order; only an explicit close removes an entry.
#[derive(Default)]
pub struct BufferStack {
    entries: Vec<(BufferId, Box<dyn Buffer>)>,
    focus: Option<BufferId>,
    next_id: u64,
}

impl BufferStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `buffer` and focus it.
    pub fn open(&mut self, buffer: Box<dyn Buffer>) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, buffer));
        self.focus = Some(id);
        id
    }

    /// Remove the buffer. When the focused buffer closes, focus moves to
    /// the entry now occupying its former position, clamped to the new
    /// last entry. Returns the removed buffer, or `None` for an unknown id.
    pub fn close(&mut self, id: BufferId) -> Option<Box<dyn Buffer>> {
        let pos = self.entries.iter().position(|(entry, _)| *entry == id)?;
        let (_, removed) = self.entries.remove(pos);
        if self.focus == Some(id) {
            self.focus = if self.entries.is_empty() {
                None
            } else {
                let successor = pos.min(self.entries.len() - 1);
                Some(self.entries[successor].0)
            };
        }
        Some(removed)
    }

    /// Focus `id`. Returns false for an unknown id, leaving focus alone.
    pub fn focus(&mut self, id: BufferId) -> bool {
        if self.contains(id) {
            self.focus = Some(id);
            true
        } else {
            false
        }
    }

    /// Move focus by a signed offset with wraparound. The stack must be
    /// non-empty; `None` reports the violated precondition.
    pub fn cycle_focus(&mut self, offset: isize) -> Option<BufferId> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len() as isize;
        let current = self
            .focus
            .and_then(|id| self.entries.iter().position(|(entry, _)| *entry == id))
            .unwrap_or(0) as isize;
        let target = (current + offset).rem_euclid(len) as usize;
        let id = self.entries[target].0;
        self.focus = Some(id);
        Some(id)
    }

    #[must_use]
    pub fn focused(&self) -> Option<BufferId> {
        self.focus
    }

    #[must_use]
    pub fn focused_buffer(&self) -> Option<&dyn Buffer> {
        self.focus.and_then(|id| self.get(id))
    }

    /// Command mode of the focused buffer; "global" for an empty stack.
    #[must_use]
    pub fn current_mode(&self) -> &'static str {
        match self.focused_buffer() {
            Some(buffer) => buffer.kind().mode(),
            None => crate::registry::GLOBAL_MODE,
        }
    }

    #[must_use]
    pub fn contains(&self, id: BufferId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    #[must_use]
    pub fn get(&self, id: BufferId) -> Option<&dyn Buffer> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, buffer)| buffer.as_ref())
    }

    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut Box<dyn Buffer>> {
        self.entries
            .iter_mut()
            .find(|(entry, _)| *entry == id)
            .map(|(_, buffer)| buffer)
    }

    /// Ids of all buffers of `kind`, in stack order.
    #[must_use]
    pub fn of_kind(&self, kind: BufferKind) -> Vec<BufferId> {
        self.entries
            .iter()
            .filter(|(_, buffer)| buffer.kind() == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<BufferId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BufferId, &dyn Buffer)> {
        self.entries
            .iter()
            .map(|(id, buffer)| (*id, buffer.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
