//! The call stack the evaluator maintains and introspection reads

use super::frames::Frame;

#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
    /// Path of the chunk being run, for frames that carry none themselves
    pub script_path: Option<String>,
}

impl CallStack {
    pub fn new(script_path: Option<String>) -> Self {
        CallStack {
            frames: Vec::new(),
            script_path,
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Drop frames until at most `depth` remain
    pub fn unwind_to(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Frame `level` calls below the top; level 1 is the most recent frame
    pub fn frame_at_level(&self, level: usize) -> Option<&Frame> {
        if level == 0 || level > self.frames.len() {
            return None;
        }
        self.frames.get(self.frames.len() - level)
    }

    /// Frames from most recent to oldest
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::frames::FrameKind;

    fn named(name: &str) -> Frame {
        Frame::new(Some(name.to_string()), FrameKind::Lua)
    }

    #[test]
    fn test_frame_at_level_counts_from_top() {
        let mut stack = CallStack::new(None);
        stack.push(named("main"));
        stack.push(named("outer"));
        stack.push(named("inner"));

        assert_eq!(stack.frame_at_level(1).and_then(|f| f.name.as_deref()), Some("inner"));
        assert_eq!(stack.frame_at_level(3).and_then(|f| f.name.as_deref()), Some("main"));
    }

    #[test]
    fn test_frame_at_level_out_of_range() {
        let mut stack = CallStack::new(None);
        stack.push(named("main"));
        assert!(stack.frame_at_level(0).is_none());
        assert!(stack.frame_at_level(2).is_none());
    }

    #[test]
    fn test_top_follows_push_and_pop() {
        let mut stack = CallStack::new(Some("main.lua".to_string()));
        assert!(stack.top().is_none());
        stack.push(named("a"));
        stack.push(named("b"));
        assert_eq!(stack.pop().and_then(|f| f.name), Some("b".to_string()));
        assert_eq!(stack.top().and_then(|f| f.name.as_deref()), Some("a"));
        assert_eq!(stack.depth(), 1);
    }
}
