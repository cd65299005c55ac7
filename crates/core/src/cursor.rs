//! A frame-stack cursor over a [`TokenForest`]. Each frame walks one
//! sequence; entering an entry pushes a frame over its interior.

use crate::token::{EntryId, SeqRef, Token, TokenForest};

#[derive(Debug, Clone)]
struct Frame {
    seq: SeqRef,
    pos: usize,
    end: usize,
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    forest: &'a TokenForest,
    frames: Vec<Frame>,
}

impl<'a> Cursor<'a> {
    /// A cursor over the root sequence.
    pub fn new(forest: &'a TokenForest) -> Self {
        Self::over(forest, SeqRef::Root)
    }

    /// A cursor over the interior of `seq`.
    pub fn over(forest: &'a TokenForest, seq: SeqRef) -> Self {
        Cursor {
            forest,
            frames: vec![Self::frame(forest, seq)],
        }
    }

    fn frame(forest: &TokenForest, seq: SeqRef) -> Frame {
        let (pos, end) = match seq {
            SeqRef::Root => (0, forest.root().len()),
            SeqRef::Entry(id) => {
                let range = forest.entry(id).interior_range();
                (range.start, range.end)
            }
        };
        Frame { seq, pos, end }
    }

    pub fn forest(&self) -> &'a TokenForest {
        self.forest
    }

    fn top(&self) -> &Frame {
        // the base frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    pub fn seq(&self) -> SeqRef {
        self.top().seq
    }

    /// Nesting depth below the starting sequence.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn at_end(&self) -> bool {
        let frame = self.top();
        frame.pos >= frame.end
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.peek_nth(0)
    }

    /// The token `n` places ahead in the current frame.
    pub fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        let frame = self.top();
        let pos = frame.pos + n;
        if pos >= frame.end {
            return None;
        }
        self.forest.seq(frame.seq).get(pos)
    }

    /// Tokens from the current one to the end of the frame.
    pub fn rest(&self) -> &'a [Token] {
        let frame = self.top();
        let tokens = self.forest.seq(frame.seq);
        tokens.get(frame.pos..frame.end).unwrap_or(&[])
    }

    pub fn advance(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.pos < frame.end {
                frame.pos += 1;
            }
        }
    }

    /// Descend into the interior of `entry`. The parent frame stays on the
    /// entry's token until [`Cursor::exit_nested`] and an `advance`.
    pub fn enter_nested(&mut self, entry: EntryId) {
        let frame = Self::frame(self.forest, SeqRef::Entry(entry));
        self.frames.push(frame);
    }

    /// Leave the innermost nested frame, returning the entry it walked.
    pub fn exit_nested(&mut self) -> Option<EntryId> {
        if self.frames.len() <= 1 {
            return None;
        }
        match self.frames.pop().map(|f| f.seq) {
            Some(SeqRef::Entry(id)) => Some(id),
            _ => None,
        }
    }

    /// Step over comment entries.
    pub fn skip_comments(&mut self) {
        while let Some(id) = self.peek().and_then(Token::entry) {
            if !self.forest.entry(id).is_comment() {
                break;
            }
            self.advance();
        }
    }

    /// Byte offset of the current token, or of the end of the frame.
    pub fn offset(&self) -> usize {
        if let Some(token) = self.peek() {
            return token.start;
        }
        let frame = self.top();
        match frame.seq {
            SeqRef::Root => self.forest.text().len(),
            SeqRef::Entry(id) => {
                let entry = self.forest.entry(id);
                match entry.tokens.get(frame.end) {
                    Some(end_token) => end_token.start,
                    None => entry.end_offset(),
                }
            }
        }
    }
}
