// Color scale - diverging cool-to-warm gradient for marker colors

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`, each channel rounded to the nearest byte.
    pub fn to_hex(self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// Comma separated 0-255 channels, for CSS `rgba()`.
    pub fn to_css_channels(self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("{},{},{}", byte(self.r), byte(self.g), byte(self.b))
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }
}

/// Color returned for ratios that are not a number.
pub const BAD_COLOR: Rgb = Rgb::new(0.0, 0.0, 0.0);

/// Number of discrete colors a ratio is snapped to before interpolation.
const LUT_SIZE: usize = 256;

/// Moreland's cool-warm diverging map, 33 evenly spaced control points.
const COOLWARM: [(f64, f64, f64, f64); 33] = [
    (0.0, 0.229_805_700, 0.298_717_966, 0.753_683_153),
    (0.03125, 0.266_233_880, 0.353_094_838, 0.801_466_763),
    (0.0625, 0.303_868_910, 0.406_535_296, 0.844_958_670),
    (0.09375, 0.342_804_478, 0.458_757_618, 0.883_725_899),
    (0.125, 0.383_013_340, 0.509_419_040, 0.917_387_822),
    (0.15625, 0.424_369_608, 0.558_148_092, 0.945_619_588),
    (0.1875, 0.466_667_080, 0.604_562_568, 0.968_154_911),
    (0.21875, 0.509_635_204, 0.648_280_772, 0.984_788_140),
    (0.25, 0.552_953_156, 0.688_929_332, 0.995_375_608),
    (0.28125, 0.596_262_162, 0.726_149_107, 0.999_836_203),
    (0.3125, 0.639_176_211, 0.759_599_947, 0.998_151_185),
    (0.34375, 0.681_291_281, 0.788_964_712, 0.990_363_227),
    (0.375, 0.722_193_294, 0.813_952_739, 0.976_574_709),
    (0.40625, 0.761_464_949, 0.834_302_879, 0.956_945_269),
    (0.4375, 0.798_691_636, 0.849_786_142, 0.931_688_648),
    (0.46875, 0.833_466_556, 0.860_207_984, 0.901_068_838),
    (0.5, 0.865_395_197, 0.865_410_210, 0.865_395_561),
    (0.53125, 0.897_787_179, 0.848_937_047, 0.820_880_546),
    (0.5625, 0.924_127_593, 0.827_384_882, 0.774_508_472),
    (0.59375, 0.944_468_518, 0.800_927_443, 0.726_736_146),
    (0.625, 0.958_852_946, 0.769_767_752, 0.678_007_945),
    (0.65625, 0.967_328_030, 0.734_132_809, 0.628_751_763),
    (0.6875, 0.969_954_137, 0.694_266_682, 0.579_375_448),
    (0.71875, 0.966_811_177, 0.650_421_156, 0.530_263_762),
    (0.75, 0.958_003_065, 0.602_842_431, 0.481_775_914),
    (0.78125, 0.943_660_866, 0.551_750_968, 0.434_243_684),
    (0.8125, 0.923_944_917, 0.497_308_560, 0.387_970_225),
    (0.84375, 0.899_046_170, 0.439_559_467, 0.343_229_596),
    (0.875, 0.869_186_849, 0.378_313_092, 0.300_267_182),
    (0.90625, 0.834_620_542, 0.312_874_446, 0.259_301_199),
    (0.9375, 0.795_631_745, 0.241_283_790, 0.220_525_627),
    (0.96875, 0.752_534_934, 0.157_246_067, 0.184_115_123),
    (1.0, 0.705_673_158, 0.015_556_160, 0.150_232_812),
];

#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<(f64, Rgb)>,
    levels: usize,
}

impl Gradient {
    /// Blue through light grey to red, low to high.
    pub fn coolwarm() -> Self {
        Self {
            stops: COOLWARM
                .iter()
                .map(|&(at, r, g, b)| (at, Rgb::new(r, g, b)))
                .collect(),
            levels: LUT_SIZE,
        }
    }

    pub fn low(&self) -> Rgb {
        self.stops[0].1
    }

    pub fn high(&self) -> Rgb {
        self.stops[self.stops.len() - 1].1
    }

    /// Color at `ratio`; anything outside `[0, 1]` sticks to the end colors.
    ///
    /// The ratio first snaps to one of `levels` evenly spaced entries, the
    /// same lookup a 256-color map table does.
    pub fn sample(&self, ratio: f64) -> Rgb {
        if ratio.is_nan() {
            return BAD_COLOR;
        }
        if ratio <= 0.0 {
            return self.low();
        }
        if ratio >= 1.0 {
            return self.high();
        }

        let index = ((ratio * self.levels as f64) as usize).min(self.levels - 1);
        self.at(index as f64 / (self.levels - 1) as f64)
    }

    /// Linear interpolation between the stops around `x`.
    fn at(&self, x: f64) -> Rgb {
        for pair in self.stops.windows(2) {
            let (start, from) = pair[0];
            let (end, to) = pair[1];
            if x <= end {
                return from.lerp(to, (x - start) / (end - start));
            }
        }

        self.high()
    }

    /// Color for `value` on a `0..=scale_max` scale.
    pub fn color_for(&self, value: f64, scale_max: f64) -> Rgb {
        self.sample(value / scale_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_and_mid_colors() {
        let gradient = Gradient::coolwarm();
        assert_eq!(gradient.color_for(0.0, 80.0).to_hex(), "#3b4cc0");
        assert_eq!(gradient.color_for(40.0, 80.0).to_hex(), "#dddcdc");
        assert_eq!(gradient.color_for(80.0, 80.0).to_hex(), "#b40426");
    }

    #[test]
    fn test_quarter_points() {
        let gradient = Gradient::coolwarm();
        assert_eq!(gradient.sample(0.25).to_hex(), "#8db0fe");
        assert_eq!(gradient.sample(0.75).to_hex(), "#f4987a");
    }

    #[test]
    fn test_out_of_range_clamps_to_ends() {
        let gradient = Gradient::coolwarm();
        assert_eq!(gradient.color_for(-15.0, 80.0).to_hex(), gradient.low().to_hex());
        assert_eq!(gradient.color_for(250.0, 80.0).to_hex(), gradient.high().to_hex());
    }

    #[test]
    fn test_nan_maps_to_bad_color() {
        let gradient = Gradient::coolwarm();
        assert_eq!(gradient.sample(f64::NAN), BAD_COLOR);
        assert_eq!(gradient.color_for(0.0, 0.0).to_hex(), "#000000");
    }

    #[test]
    fn test_ratios_snap_to_table_entries() {
        let gradient = Gradient::coolwarm();
        // 0.5 and 0.501 both land on entry 128 of 256.
        assert_eq!(gradient.sample(0.5), gradient.sample(0.501));
        assert_ne!(gradient.sample(0.5), gradient.sample(0.5 + 1.0 / 256.0));
    }

    #[test]
    fn test_linear_between_control_points() {
        let gradient = Gradient::coolwarm();
        let low = gradient.at(0.0);
        let next = gradient.at(0.03125);
        let between = gradient.at(0.015625);

        assert!((between.r - (low.r + next.r) / 2.0).abs() < 1e-12);
        assert!((between.g - (low.g + next.g) / 2.0).abs() < 1e-12);
        assert!((between.b - (low.b + next.b) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_red_channel_rises_through_lower_half() {
        let gradient = Gradient::coolwarm();
        let reds: Vec<f64> = (0..=10).map(|i| gradient.sample(i as f64 * 0.05).r).collect();
        assert!(reds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_css_channels() {
        assert_eq!(Gradient::coolwarm().sample(0.5).to_css_channels(), "221,220,220");
    }
}
