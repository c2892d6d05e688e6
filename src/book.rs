//! A library catalog of books keyed by numeric id.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::CatalogTree;
use crate::error::DuplicateKeyError;

/// Identifier a book is catalogued under.
pub type BookId = u32;

/// A catalogued book.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Book {
    /// Catalogue key.
    pub id: BookId,
    /// Title as displayed in the library table.
    pub title: String,
    /// Author name.
    pub author: String,
}

impl Book {
    #[must_use]
    pub fn new(id: BookId, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\" by {}", self.id, self.title, self.author)
    }
}

/// A B-tree catalog of books.
pub type Library = CatalogTree<BookId, Book>;

impl CatalogTree<BookId, Book> {
    /// Catalogues `book` under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKeyError`] if a book with the same id is already catalogued.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_btree::{Book, Library};
    ///
    /// let mut library = Library::new();
    /// library.add_book(Book::new(7, "Operating Systems", "William Stallings")).unwrap();
    /// assert!(library.add_book(Book::new(7, "Another", "Someone")).is_err());
    /// assert_eq!(library.get(&7).unwrap().to_string(), "7: \"Operating Systems\" by William Stallings");
    /// ```
    pub fn add_book(&mut self, book: Book) -> Result<(), DuplicateKeyError<BookId>> {
        self.insert(book.id, book)
    }

    /// Catalogues every book in order, stopping at the first duplicate id.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKeyError`] for the first duplicate; books before it stay
    /// catalogued.
    pub fn add_books(&mut self, books: impl IntoIterator<Item = Book>) -> Result<(), DuplicateKeyError<BookId>> {
        books.into_iter().try_for_each(|book| self.add_book(book))
    }
}

/// Five demonstration books, in the order they are meant to be added.
#[must_use]
pub fn sample_books() -> Vec<Book> {
    [
        (50, "Data Structures and Algorithms", "Thomas Cormen"),
        (25, "Introduction to Programming", "John Smith"),
        (75, "Advanced Database Systems", "Jane Doe"),
        (15, "Computer Networks", "Andrew Tanenbaum"),
        (35, "Operating Systems", "William Stallings"),
    ]
    .into_iter()
    .map(|(id, title, author)| Book::new(id, title, author))
    .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_format() {
        let book = Book::new(15, "Computer Networks", "Andrew Tanenbaum");
        assert_eq!(book.to_string(), "15: \"Computer Networks\" by Andrew Tanenbaum");
    }

    #[test]
    fn sample_library() {
        let mut library = Library::with_min_degree(2).unwrap();
        library.add_books(sample_books()).unwrap();

        assert_eq!(library.len(), 5);
        assert_eq!(library.height(), 2);
        let ids: Vec<BookId> = library.entries().map(|(id, _)| *id).collect();
        assert_eq!(ids, [15, 25, 35, 50, 75]);
        assert_eq!(library.search(&75).unwrap().record.author, "Jane Doe");
    }

    #[test]
    fn add_books_stops_at_duplicate() {
        let mut library = Library::new();
        let books = [
            Book::new(1, "A", "a"),
            Book::new(1, "B", "b"),
            Book::new(2, "C", "c"),
        ];
        assert_eq!(library.add_books(books), Err(DuplicateKeyError { key: 1 }));
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(&1).unwrap().title, "A");
    }
}
