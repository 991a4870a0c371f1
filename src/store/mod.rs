//! On-disk state of a target directory.
//!
//! - [`HashIndex`] knows which payloads already exist (by SHA-256)
//! - [`next_index`] hands out `image_<N>` numbers
//! - [`Organizer`] applies verdicts and consolidates the final layout
//! - [`create_archive`] packs the result into `<target>.zip`

mod archive;
mod hash_index;
mod organizer;
mod sequencer;

pub use archive::{ArchiveError, archive_path, create_archive};
pub use hash_index::{HashIndex, hash_file};
pub use organizer::{
    Applied, COLOR_DIR, FinalizeReport, GIFS_DIR, GREYSCALE_DIR, OrganizeError, Organizer,
    TRANSIENT_DIRS, VIDEOS_DIR, list_files, move_with_increment,
};
pub use sequencer::{next_index, parse_sequential_index};
