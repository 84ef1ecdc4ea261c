//! Camera pair replaying recorded frames from disk

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use comms_if::eqpt::cam::{CamId, Resolution};

use super::{CamClientError, CamParams, CameraPair};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Replays stereo pairs stored as `left_NNNN.png` and `right_NNNN.png` in a directory.
///
/// Pairs are served in index order and the sequence restarts once exhausted. Indices without both
/// a left and a right frame are skipped.
pub struct ReplayCamPair {
    dir: PathBuf,

    resolution: Resolution,

    fov_rad: f64,

    /// Recorded `(left, right)` paths in index order.
    pairs: Vec<(PathBuf, PathBuf)>,

    next: usize,

    swapped: bool,

    connected: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReplayCamPair {
    pub fn new<P: AsRef<Path>>(dir: P, params: &CamParams) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            resolution: params.resolution,
            fov_rad: params.fov_horizontal_rad,
            pairs: Vec::new(),
            next: 0,
            swapped: false,
            connected: false,
        }
    }

    /// Number of recorded pairs found on connection.
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    fn load(&self, cam: CamId, path: &Path) -> Result<RgbImage, CamClientError> {
        let img = image::open(path)
            .map_err(|e| CamClientError::ImageLoadError(cam, path.to_path_buf(), e))?
            .to_rgb8();

        let found = Resolution::new(img.width(), img.height());
        if found != self.resolution {
            return Err(CamClientError::ResolutionMismatch {
                cam,
                expected: self.resolution,
                found,
            });
        }

        Ok(img)
    }
}

impl CameraPair for ReplayCamPair {
    type Frame = RgbImage;

    fn connect(&mut self) -> Result<(), CamClientError> {
        self.pairs = find_pairs(&self.dir)?;
        self.next = 0;

        if self.pairs.is_empty() {
            return Err(CamClientError::NoFrames(self.dir.clone()));
        }

        info!(
            "Replaying {} stereo pairs from {:?}",
            self.pairs.len(),
            self.dir
        );
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn capture_pair(&mut self) -> Result<(RgbImage, RgbImage), CamClientError> {
        if !self.connected || self.pairs.is_empty() {
            return Err(CamClientError::NotConnected);
        }

        let (left_path, right_path) = self.pairs[self.next].clone();
        self.next = (self.next + 1) % self.pairs.len();

        let left = self.load(CamId::Left, &left_path)?;
        let right = self.load(CamId::Right, &right_path)?;

        if self.swapped {
            Ok((right, left))
        } else {
            Ok((left, right))
        }
    }

    fn swap(&mut self) {
        self.swapped = !self.swapped;
        debug!("Camera roles swapped: {}", self.swapped);
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn fov_rad(&self) -> f64 {
        self.fov_rad
    }
}

/// Find all complete pairs in `dir`, sorted by index.
fn find_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>, CamClientError> {
    let entries =
        fs::read_dir(dir).map_err(|e| CamClientError::DirReadError(dir.to_path_buf(), e))?;

    let mut indices: Vec<u32> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| frame_index(&e.file_name().to_string_lossy(), "left_"))
        .collect();
    indices.sort_unstable();

    Ok(indices
        .into_iter()
        .map(|i| {
            (
                dir.join(format!("left_{:04}.png", i)),
                dir.join(format!("right_{:04}.png", i)),
            )
        })
        .filter(|(_, right)| right.is_file())
        .collect())
}

fn frame_index(file_name: &str, prefix: &str) -> Option<u32> {
    file_name
        .strip_prefix(prefix)?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    fn write_frame(dir: &Path, name: &str, value: u8) {
        RgbImage::from_pixel(8, 6, Rgb([value, 0, 0]))
            .save(dir.join(name))
            .unwrap();
    }

    fn params() -> CamParams {
        CamParams {
            resolution: Resolution::new(8, 6),
            ..Default::default()
        }
    }

    #[test]
    fn test_frame_index() {
        assert_eq!(frame_index("left_0012.png", "left_"), Some(12));
        assert_eq!(frame_index("right_0012.png", "left_"), None);
        assert_eq!(frame_index("left_x.png", "left_"), None);
    }

    #[test]
    fn test_replay_cycles_and_swaps() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "left_0000.png", 10);
        write_frame(dir.path(), "right_0000.png", 20);
        write_frame(dir.path(), "left_0001.png", 30);
        write_frame(dir.path(), "right_0001.png", 40);
        // Incomplete pair is ignored
        write_frame(dir.path(), "left_0002.png", 50);

        let mut cams = ReplayCamPair::new(dir.path(), &params());
        cams.connect().unwrap();
        assert_eq!(cams.num_pairs(), 2);

        let (l, r) = cams.capture_pair().unwrap();
        assert_eq!((l.get_pixel(0, 0)[0], r.get_pixel(0, 0)[0]), (10, 20));

        cams.swap();
        let (l, r) = cams.capture_pair().unwrap();
        assert_eq!((l.get_pixel(0, 0)[0], r.get_pixel(0, 0)[0]), (40, 30));

        // Back to the first pair
        let (l, _) = cams.capture_pair().unwrap();
        assert_eq!(l.get_pixel(0, 0)[0], 20);
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cams = ReplayCamPair::new(dir.path(), &params());

        assert!(matches!(cams.connect(), Err(CamClientError::NoFrames(_))));
        assert!(!cams.is_connected());
        assert!(matches!(
            cams.capture_pair(),
            Err(CamClientError::NotConnected)
        ));
    }

    #[test]
    fn test_resolution_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "left_0000.png", 10);
        write_frame(dir.path(), "right_0000.png", 20);

        let mut cams = ReplayCamPair::new(
            dir.path(),
            &CamParams {
                resolution: Resolution::new(640, 480),
                ..Default::default()
            },
        );
        cams.connect().unwrap();

        assert!(matches!(
            cams.capture_pair(),
            Err(CamClientError::ResolutionMismatch { cam: CamId::Left, .. })
        ));
    }
}
