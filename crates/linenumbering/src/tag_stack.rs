//! Lazily emitted open-element stack.
//!
//! Passes that cut a unit apart push `Open`/`Close` here instead of straight
//! into their output. An element is written only once content inside it is
//! written, and closed only if it was written. Suspending closes the inline
//! elements above the innermost block; they re-open with the same shell the
//! next time content needs them.

use html::dom_utils::is_block_element;
use html::{Event, Node, StructuralError, StructuralErrorKind};

#[derive(Debug)]
struct Entry {
    shell: Node,
    block: bool,
    emitted: bool,
    /// Emitted at least once.
    touched: bool,
    /// Had children in the input, whether or not they were written.
    had_content: bool,
}

/// Invariant: emitted entries form a prefix of the stack.
#[derive(Debug, Default)]
pub(crate) struct TagStack {
    entries: Vec<Entry>,
}

impl TagStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn depth(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn top_is_block(&self) -> bool {
        self.entries.last().is_some_and(|e| e.block)
    }

    /// Push an element without writing it. The bottom entry counts as a block.
    pub(crate) fn open(&mut self, shell: Node) {
        self.mark_content();
        let block = self.entries.is_empty() || shell.name().is_some_and(is_block_element);
        self.entries.push(Entry {
            shell,
            block,
            emitted: false,
            touched: false,
            had_content: false,
        });
    }

    /// Pop the innermost element. With `keep_empty`, an element that had no
    /// children in the input is written as an empty pair.
    pub(crate) fn close(
        &mut self,
        out: &mut Vec<Event>,
        keep_empty: bool,
    ) -> Result<(), StructuralError> {
        let Some(top) = self.entries.last() else {
            return Err(StructuralError::new(StructuralErrorKind::UnbalancedEvents));
        };
        if keep_empty && !top.had_content && !top.touched {
            self.flush(out);
        }
        if let Some(entry) = self.entries.pop()
            && entry.emitted
        {
            out.push(Event::Close);
        }
        Ok(())
    }

    pub(crate) fn mark_content(&mut self) {
        if let Some(top) = self.entries.last_mut() {
            top.had_content = true;
        }
    }

    /// Write every pending entry.
    pub(crate) fn flush(&mut self, out: &mut Vec<Event>) {
        let end = self.entries.len();
        self.emit_until(out, end);
    }

    /// Write pending entries up to and including the innermost block.
    pub(crate) fn flush_blocks(&mut self, out: &mut Vec<Event>) {
        if let Some(block) = self.innermost_block() {
            self.emit_until(out, block + 1);
        }
    }

    /// Close written inline entries above the innermost block.
    pub(crate) fn suspend_inline(&mut self, out: &mut Vec<Event>) {
        let start = self.innermost_block().map_or(0, |b| b + 1);
        for entry in self.entries[start..].iter_mut().rev() {
            if entry.emitted {
                out.push(Event::Close);
                entry.emitted = false;
            }
        }
    }

    /// Shells of the written inline entries above the innermost block.
    pub(crate) fn inline_context(&self) -> Vec<Node> {
        let start = self.innermost_block().map_or(0, |b| b + 1);
        self.entries[start..]
            .iter()
            .filter(|e| e.emitted)
            .map(|e| e.shell.clone())
            .collect()
    }

    /// Names of the written entries up to the innermost block, outermost first.
    pub(crate) fn block_path(&self) -> Vec<String> {
        let end = self.innermost_block().map_or(0, |b| b + 1);
        self.entries[..end]
            .iter()
            .filter(|e| e.emitted)
            .filter_map(|e| e.shell.name().map(str::to_string))
            .collect()
    }

    fn innermost_block(&self) -> Option<usize> {
        self.entries.iter().rposition(|e| e.block)
    }

    fn emit_until(&mut self, out: &mut Vec<Event>, end: usize) {
        for entry in &mut self.entries[..end] {
            if !entry.emitted {
                out.push(Event::Open(entry.shell.clone()));
                entry.emitted = true;
                entry.touched = true;
            }
        }
    }
}
