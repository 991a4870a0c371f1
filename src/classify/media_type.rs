//! Video / GIF separation.

use std::path::{Path, PathBuf};

use super::Verdict;
use crate::media::MediaKind;
use crate::store::{GIFS_DIR, VIDEOS_DIR};

/// Routes videos into `videos/` and GIFs into `gifs/` under `target`.
///
/// Stills produce no verdict.
#[must_use]
pub fn split_by_media_type(files: &[PathBuf], target: &Path) -> Vec<Verdict> {
    files
        .iter()
        .filter_map(|path| match MediaKind::from_path(path)? {
            MediaKind::Video => Some(Verdict::move_to(path, target.join(VIDEOS_DIR), "video")),
            MediaKind::Gif => Some(Verdict::move_to(path, target.join(GIFS_DIR), "gif")),
            MediaKind::Image => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::VerdictKind;

    #[test]
    fn test_split_routes_by_extension() {
        let target = Path::new("/t");
        let files = vec![
            target.join("image_1.MP4"),
            target.join("image_2.gif"),
            target.join("image_3.jpg"),
            target.join("image_4.webm"),
        ];
        let verdicts = split_by_media_type(&files, target);
        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts[0].kind, VerdictKind::Move(PathBuf::from("/t/videos")));
        assert_eq!(verdicts[1].kind, VerdictKind::Move(PathBuf::from("/t/gifs")));
        assert_eq!(verdicts[2].path, PathBuf::from("/t/image_4.webm"));
    }
}
