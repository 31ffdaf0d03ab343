use std::fmt;

/// The 39 books of the Old Testament canon
pub const OLD_TESTAMENT_BOOKS: [&str; 39] = [
    "Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy",
    "Joshua", "Judges", "Ruth", "1 Samuel", "2 Samuel",
    "1 Kings", "2 Kings", "1 Chronicles", "2 Chronicles", "Ezra",
    "Nehemiah", "Esther", "Job", "Psalms", "Proverbs",
    "Ecclesiastes", "Song of Solomon", "Isaiah", "Jeremiah", "Lamentations",
    "Ezekiel", "Daniel", "Hosea", "Joel", "Amos",
    "Obadiah", "Jonah", "Micah", "Nahum", "Habakkuk",
    "Zephaniah", "Haggai", "Zechariah", "Malachi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    /// Classify a book by name.
    ///
    /// Names outside the Old Testament set, including unknown ones, are New
    /// Testament.
    pub fn classify(book_name: &str) -> Self {
        let name = book_name.trim();
        if OLD_TESTAMENT_BOOKS.iter().any(|ot| ot.eq_ignore_ascii_case(name)) {
            Testament::Old
        } else {
            Testament::New
        }
    }

    /// Value stored in `Books.Testament`
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "OT",
            Testament::New => "NT",
        }
    }
}

impl fmt::Display for Testament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
