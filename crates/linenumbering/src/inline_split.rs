//! Hoists line markers out of inline formatting.
//!
//! `<strong>a <br><span…>b</strong>` becomes
//! `<strong>a </strong><br><span…><strong>b</strong>`: every marker ends up
//! directly inside its nearest block ancestor, with the inline elements it
//! interrupted closed before it and re-opened, same shell, after it.

use html::{Event, StructuralError, rebuild_single};

use crate::markers::{event_marker, marker_events};
use crate::tag_stack::TagStack;
use crate::types::ParagraphUnit;

pub fn split_inline_at_anchors(unit: ParagraphUnit) -> Result<ParagraphUnit, StructuralError> {
    let events = marker_events(unit.node.clone());
    let split = split_events(events)?;
    Ok(unit.with_node(rebuild_single(split)?))
}

pub(crate) fn split_events(events: Vec<Event>) -> Result<Vec<Event>, StructuralError> {
    let mut out = Vec::with_capacity(events.len());
    let mut stack = TagStack::new();
    for event in events {
        match event {
            Event::Open(shell) => {
                stack.open(shell);
                if stack.depth() == 1 {
                    stack.flush(&mut out);
                }
            }
            Event::Close => stack.close(&mut out, true)?,
            event if event_marker(&event).is_some() => {
                stack.suspend_inline(&mut out);
                stack.flush_blocks(&mut out);
                stack.mark_content();
                out.push(event);
            }
            event => {
                stack.flush(&mut out);
                stack.mark_content();
                out.push(event);
            }
        }
    }
    Ok(out)
}
