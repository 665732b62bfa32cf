pub mod google_books;
pub mod omdb;

pub use google_books::GoogleBooksClient;
pub use omdb::OmdbClient;
