use image::RgbaImage;

/// 像素计数到面积换算的校准系数，对应栅格化管线中观测到的覆盖率翻倍。
pub const AREA_CALIBRATION: f64 = 2.0;

/// 以 0 为阈值二值化：任一颜色通道非零即为前景，alpha 不参与判断。
pub fn count_foreground(image: &RgbaImage) -> u64 {
    image
        .pixels()
        .filter(|pixel| pixel.0[..3].iter().any(|&channel| channel != 0))
        .count() as u64
}

/// `面积 = 前景像素数 × AREA_CALIBRATION / scale²`。
pub fn estimate_area(image: &RgbaImage, scale: f64) -> f64 {
    debug_assert!(scale > 0.0);
    pixels_to_area(count_foreground(image), scale)
}

#[inline]
pub fn pixels_to_area(pixel_count: u64, scale: f64) -> f64 {
    pixel_count as f64 * AREA_CALIBRATION / (scale * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn all_background_is_zero() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        assert_eq!(count_foreground(&image), 0);
        assert_eq!(estimate_area(&image, 3.0), 0.0);

        let transparent = RgbaImage::new(8, 8);
        assert_eq!(estimate_area(&transparent, 1.0), 0.0);
    }

    #[test]
    fn full_foreground_scales_by_calibration() {
        let (w, h) = (20u32, 10u32);
        let image = RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255]));
        let scale = 4.0;
        let expected = f64::from(w * h) * 2.0 / (scale * scale);
        assert!((estimate_area(&image, scale) - expected).abs() < 1e-12);
    }

    #[test]
    fn any_nonzero_channel_counts() {
        let mut image = RgbaImage::from_pixel(4, 1, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([1, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 128, 0, 255]));
        image.put_pixel(2, 0, Rgba([0, 0, 0, 10]));
        assert_eq!(count_foreground(&image), 2);
    }
}
