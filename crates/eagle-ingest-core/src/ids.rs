//! Random identifiers for assets and folders.
//!
//! Asset ids are `K` followed by 12 alphanumerics; folder ids are 13
//! alphanumerics. Generation alone does not guarantee uniqueness: callers go
//! through [`allocate_unique`] (or claim a directory exclusively) to close the
//! collision gap.

use crate::error::{Error, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

pub const ID_LEN: usize = 13;
pub const ASSET_ID_PREFIX: char = 'K';
/// Folder ids written by older tools may be as short as this.
pub const MIN_FOLDER_ID_LEN: usize = 11;

pub fn new_asset_id() -> String {
    new_asset_id_with(&mut rand::thread_rng())
}

pub fn new_asset_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(ID_LEN);
    id.push(ASSET_ID_PREFIX);
    id.extend(random_chars(rng, ID_LEN - 1));
    id
}

pub fn new_folder_id() -> String {
    new_folder_id_with(&mut rand::thread_rng())
}

pub fn new_folder_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_chars(rng, ID_LEN).collect()
}

fn random_chars<R: Rng + ?Sized>(rng: &mut R, len: usize) -> impl Iterator<Item = char> + '_ {
    (0..len).map(move |_| char::from(rng.sample(Alphanumeric)))
}

pub fn is_asset_id(s: &str) -> bool {
    s.len() == ID_LEN
        && s.starts_with(ASSET_ID_PREFIX)
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_folder_id(s: &str) -> bool {
    (MIN_FOLDER_ID_LEN..=ID_LEN).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Generate ids until one is not taken, giving up after `max_attempts`.
pub fn allocate_unique<G, T>(
    kind: &'static str,
    max_attempts: u32,
    mut generate: G,
    mut is_taken: T,
) -> Result<String>
where
    G: FnMut() -> String,
    T: FnMut(&str) -> bool,
{
    for attempt in 1..=max_attempts {
        let candidate = generate();
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        debug!("{} id {} already taken (attempt {})", kind, candidate, attempt);
    }
    Err(Error::IdExhausted {
        kind,
        attempts: max_attempts,
    })
}
