//! Per-chunk list of text signs attached to block faces.

/// Maximum number of characters kept for a sign.
pub const MAX_SIGN_LENGTH: usize = 64;

/// A text sign attached to one face of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sign {
    /// Block x.
    pub x: i32,
    /// Block y.
    pub y: i32,
    /// Block z.
    pub z: i32,
    /// Face index the sign is attached to.
    pub face: i32,
    /// Sign text, at most `MAX_SIGN_LENGTH - 1` characters.
    pub text: String,
}

/// The signs owned by a chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignList {
    signs: Vec<Sign>,
}

impl SignList {
    /// Creates an empty list.
    pub fn new() -> Self {
        SignList::default()
    }

    /// Adds a sign, replacing any sign on the same block face.
    pub fn add(&mut self, x: i32, y: i32, z: i32, face: i32, text: &str) {
        self.remove(x, y, z, face);
        self.signs.push(Sign {
            x,
            y,
            z,
            face,
            text: text.chars().take(MAX_SIGN_LENGTH - 1).collect(),
        });
    }

    /// Removes the sign on one block face.
    ///
    /// # Returns
    /// `true` if a sign was removed.
    pub fn remove(&mut self, x: i32, y: i32, z: i32, face: i32) -> bool {
        let before = self.signs.len();
        self.signs
            .retain(|s| !(s.x == x && s.y == y && s.z == z && s.face == face));
        self.signs.len() != before
    }

    /// Removes every sign on a block.
    ///
    /// # Returns
    /// `true` if any sign was removed.
    pub fn remove_all(&mut self, x: i32, y: i32, z: i32) -> bool {
        let before = self.signs.len();
        self.signs.retain(|s| !(s.x == x && s.y == y && s.z == z));
        self.signs.len() != before
    }

    /// Text of the sign on one block face.
    pub fn get(&self, x: i32, y: i32, z: i32, face: i32) -> Option<&str> {
        self.signs
            .iter()
            .find(|s| s.x == x && s.y == y && s.z == z && s.face == face)
            .map(|s| s.text.as_str())
    }

    /// The signs as a slice.
    pub fn as_slice(&self) -> &[Sign] {
        &self.signs
    }

    /// Number of signs.
    pub fn len(&self) -> usize {
        self.signs.len()
    }

    /// Returns `true` when there are no signs.
    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }

    /// Number of glyph quads needed to render every sign.
    pub fn glyph_count(&self) -> usize {
        self.signs
            .iter()
            .map(|s| s.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_same_face() {
        let mut signs = SignList::new();
        signs.add(1, 2, 3, 0, "hello");
        signs.add(1, 2, 3, 0, "bye");
        signs.add(1, 2, 3, 1, "other");
        assert_eq!(signs.len(), 2);
        assert_eq!(signs.get(1, 2, 3, 0), Some("bye"));
    }

    #[test]
    fn remove_all_clears_every_face() {
        let mut signs = SignList::new();
        signs.add(1, 2, 3, 0, "a");
        signs.add(1, 2, 3, 4, "b");
        signs.add(9, 2, 3, 4, "c");
        assert!(signs.remove_all(1, 2, 3));
        assert!(!signs.remove_all(1, 2, 3));
        assert_eq!(signs.len(), 1);
        assert_eq!(signs.glyph_count(), 1);
    }

    #[test]
    fn long_text_is_truncated() {
        let mut signs = SignList::new();
        signs.add(0, 0, 0, 0, &"x".repeat(100));
        assert_eq!(signs.get(0, 0, 0, 0).unwrap().len(), MAX_SIGN_LENGTH - 1);
    }
}
