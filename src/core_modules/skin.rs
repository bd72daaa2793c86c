// THEORY:
// The `skin` module holds the per-pixel color model at the heart of the presence
// heuristic. A pixel only counts as "facial skin" when two independent predicates
// agree:
//
// 1.  **RGB-ratio predicate**: a set of channel-difference bounds that describe
//     the red-dominant balance of skin under normal lighting, with guards that
//     reject pixels that are too dark to judge or are blown-out highlights.
// 2.  **YCbCr predicate**: a rectangular region of the BT.601 chroma plane that
//     human skin tones cluster in, plus a luma band that excludes shadows and
//     glare.
//
// Requiring both keeps the false-positive rate of either model in check: the RGB
// ratios alone accept wood and cardboard, the chroma box alone accepts some
// fabrics. The constants are empirically tuned and are treated as a fixed
// behavioral contract, not values to re-derive.
//
// Everything here is a pure, deterministic function of a single pixel.

pub mod skin {
    use crate::core_modules::pixel::pixel::Pixel;

    /// Channel-difference bounds for the red-dominant skin balance.
    const MIN_RED_GREEN_DIFF: i16 = 5;
    const MAX_RED_GREEN_DIFF: i16 = 100;
    const MIN_RED_BLUE_DIFF: i16 = 10;
    const MAX_RED_BLUE_DIFF: i16 = 140;
    const MIN_GREEN_BLUE_DIFF: i16 = -30;
    const MAX_GREEN_BLUE_DIFF: i16 = 50;

    /// Luma and chroma bands of the YCbCr skin cluster.
    const MIN_LUMA: f64 = 60.0;
    const MAX_LUMA: f64 = 240.0;
    const MIN_CB: f64 = 80.0;
    const MAX_CB: f64 = 140.0;
    const MIN_CR: f64 = 130.0;
    const MAX_CR: f64 = 185.0;

    /// The RGB channel-ratio half of the skin model.
    ///
    /// Rejects pixels too dark to classify (r<60, g<40 or b<30) and blown-out
    /// highlights (all channels above 250), then requires the red-dominant
    /// channel ordering typical of skin.
    pub fn rgb_ratio_predicate(pixel: &Pixel) -> bool {
        let (r, g, b) = (pixel.red, pixel.green, pixel.blue);

        if r < 60 || g < 40 || b < 30 {
            return false;
        }
        if r > 250 && g > 250 && b > 250 {
            return false;
        }

        let rg_diff = r as i16 - g as i16;
        let rb_diff = r as i16 - b as i16;
        let gb_diff = g as i16 - b as i16;

        r >= g
            && rg_diff > MIN_RED_GREEN_DIFF
            && rg_diff < MAX_RED_GREEN_DIFF
            && rb_diff > MIN_RED_BLUE_DIFF
            && rb_diff < MAX_RED_BLUE_DIFF
            && gb_diff > MIN_GREEN_BLUE_DIFF
            && gb_diff < MAX_GREEN_BLUE_DIFF
    }

    /// The YCbCr half of the skin model: luma in (60, 240), Cb in [80, 140],
    /// Cr in [130, 185].
    pub fn ycbcr_predicate(pixel: &Pixel) -> bool {
        let (y, cb, cr) = pixel.ycbcr();

        y > MIN_LUMA
            && y < MAX_LUMA
            && cb >= MIN_CB
            && cb <= MAX_CB
            && cr >= MIN_CR
            && cr <= MAX_CR
    }

    /// A pixel is facial skin only when both predicates pass.
    pub fn is_facial_skin(pixel: &Pixel) -> bool {
        rgb_ratio_predicate(pixel) && ycbcr_predicate(pixel)
    }
}
