//! Screenshot preprocessing: band cropping and per-channel variants.

use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, Luma, RgbImage};

use super::backend::OcrError;

/// Rows kept from the top and from the bottom of a screenshot. Branding and
/// footers live there; the middle is mostly form fields.
pub const BAND_HEIGHT: u32 = 300;

/// Three colour channels, each as captured and inverted.
pub const VARIANT_COUNT: usize = 6;

/// Keep the top and bottom bands of a screenshot, stacked. Images shorter
/// than both bands together are kept whole.
pub fn crop_bands(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if height <= 2 * BAND_HEIGHT {
        return image.clone();
    }
    let top = imageops::crop_imm(image, 0, 0, width, BAND_HEIGHT).to_image();
    let bottom = imageops::crop_imm(image, 0, height - BAND_HEIGHT, width, BAND_HEIGHT).to_image();

    let mut stacked = RgbImage::new(width, 2 * BAND_HEIGHT);
    imageops::replace(&mut stacked, &top, 0, 0);
    imageops::replace(&mut stacked, &bottom, 0, i64::from(BAND_HEIGHT));
    stacked
}

/// Single-channel variant `index`: channel `index / 2`, inverted when
/// `index` is odd.
pub fn channel_variant(image: &RgbImage, index: usize) -> GrayImage {
    let channel = (index / 2) % 3;
    let inverted = index % 2 == 1;
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[channel];
        Luma([if inverted { 255 - value } else { value }])
    })
}

/// Write all variants of `screenshot` as PNGs into `dir`, in index order.
pub fn write_variants(screenshot: &Path, dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    if !screenshot.exists() {
        return Err(OcrError::ScreenshotMissing(screenshot.display().to_string()));
    }
    let image = image::open(screenshot)?.to_rgb8();
    let bands = crop_bands(&image);

    (0..VARIANT_COUNT)
        .map(|index| -> Result<PathBuf, OcrError> {
            let path = dir.join(format!("variant_{}.png", index));
            channel_variant(&bands, index).save(&path)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_short_image_kept_whole() {
        let image = RgbImage::new(10, 500);
        assert_eq!(crop_bands(&image).dimensions(), (10, 500));
    }

    #[test]
    fn test_tall_image_cropped_to_bands() {
        let mut image = RgbImage::new(4, 1000);
        image.put_pixel(0, 0, Rgb([10, 0, 0]));
        image.put_pixel(0, 999, Rgb([20, 0, 0]));
        image.put_pixel(0, 500, Rgb([99, 0, 0]));

        let bands = crop_bands(&image);
        assert_eq!(bands.dimensions(), (4, 600));
        assert_eq!(bands.get_pixel(0, 0)[0], 10);
        assert_eq!(bands.get_pixel(0, 599)[0], 20);
        assert!(bands.pixels().all(|p| p[0] != 99));
    }

    #[test]
    fn test_channel_variants() {
        let mut image = RgbImage::new(1, 1);
        image.put_pixel(0, 0, Rgb([10, 20, 30]));

        let values: Vec<u8> = (0..VARIANT_COUNT)
            .map(|i| channel_variant(&image, i).get_pixel(0, 0)[0])
            .collect();
        assert_eq!(values, vec![10, 245, 20, 235, 30, 225]);
    }

    #[test]
    fn test_write_variants() {
        let dir = tempfile::tempdir().unwrap();
        let screenshot = dir.path().join("shot.png");
        RgbImage::from_pixel(8, 8, Rgb([200, 100, 50]))
            .save(&screenshot)
            .unwrap();

        let paths = write_variants(&screenshot, dir.path()).unwrap();
        assert_eq!(paths.len(), VARIANT_COUNT);
        assert!(paths.iter().all(|p| p.exists()));
        assert!(paths[5].ends_with("variant_5.png"));
    }

    #[test]
    fn test_missing_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_variants(&dir.path().join("absent.png"), dir.path());
        assert!(matches!(result, Err(OcrError::ScreenshotMissing(_))));
    }
}
