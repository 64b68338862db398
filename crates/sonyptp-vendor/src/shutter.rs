use std::cmp::Ordering;
use std::fmt;

/// A shutter speed as the camera reports it: numerator in the high 16 bits,
/// denominator in the low 16 bits of a `u32`.
///
/// Speeds order by exposure duration, shortest ("fastest") first. Two
/// representations of the same duration order by denominator, the larger
/// one counting as faster, which matches how the camera steps between
/// them. A zero denominator is bulb, slower than any timed exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShutterSpeed {
    raw: u32,
}

impl ShutterSpeed {
    pub const BULB: ShutterSpeed = ShutterSpeed { raw: 0 };

    pub const fn new(numerator: u16, denominator: u16) -> Self {
        Self {
            raw: ((numerator as u32) << 16) | denominator as u32,
        }
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    pub const fn raw(self) -> u32 {
        self.raw
    }

    pub const fn numerator(self) -> u16 {
        (self.raw >> 16) as u16
    }

    pub const fn denominator(self) -> u16 {
        self.raw as u16
    }

    pub fn is_bulb(self) -> bool {
        self.denominator() == 0
    }

    /// Reduce the fraction so one side is 1 where the division is exact,
    /// otherwise to lowest terms: `2/1000` is `1/500`, `300/10` is `30/1`,
    /// `13/10` stays `13/10`.
    pub fn normalize(self) -> (u32, u32) {
        let (num, den) = (u32::from(self.numerator()), u32::from(self.denominator()));
        if num == 0 || den == 0 {
            return (num, den);
        }
        let g = gcd(num, den);
        (num / g, den / g)
    }

    /// Order by exposure duration. `Less` means `self` is faster.
    pub fn compare(self, other: ShutterSpeed) -> Ordering {
        let by_duration = match (self.is_bulb(), other.is_bulb()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let (a, b) = self.normalize();
                let (c, d) = other.normalize();
                (u64::from(a) * u64::from(d)).cmp(&(u64::from(c) * u64::from(b)))
            }
        };
        by_duration
            .then_with(|| other.denominator().cmp(&self.denominator()))
            .then_with(|| self.numerator().cmp(&other.numerator()))
    }

    pub fn is_faster_than(self, other: ShutterSpeed) -> bool {
        self.compare(other) == Ordering::Less
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl PartialOrd for ShutterSpeed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ShutterSpeed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(*other)
    }
}

impl From<u32> for ShutterSpeed {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for ShutterSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (num, den) = (self.numerator(), self.denominator());
        match (num, den) {
            (_, 0) => f.write_str("bulb"),
            (_, 1) => write!(f, "{num}\""),
            (_, 10) if num % 10 == 0 => write!(f, "{}\"", num / 10),
            (_, 10) => write!(f, "{}.{}\"", num / 10, num % 10),
            (1, _) => write!(f, "1/{den}"),
            _ => write!(f, "{num}/{den}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn packs_numerator_high() {
        let speed = ShutterSpeed::new(1, 1000);
        assert_eq!(speed.raw(), 0x0001_03E8);
        assert_eq!(ShutterSpeed::from_raw(0x012C_000A).numerator(), 300);
    }

    #[test]
    fn thousandth_is_faster_than_five_hundredth() {
        let fast = ShutterSpeed::new(1, 1000);
        let slow = ShutterSpeed::new(1, 500);
        assert_eq!(fast.compare(slow), Ordering::Less);
        assert_eq!(slow.compare(fast), Ordering::Greater);
        assert!(fast.is_faster_than(slow));
    }

    #[test]
    fn identical_speeds_are_equal() {
        let a = ShutterSpeed::new(1, 250);
        assert_eq!(a.compare(ShutterSpeed::new(1, 250)), Ordering::Equal);
    }

    #[test]
    fn equal_duration_prefers_larger_denominator() {
        let tenths = ShutterSpeed::new(10, 10);
        let whole = ShutterSpeed::new(1, 1);
        assert_eq!(tenths.normalize(), whole.normalize());
        assert!(tenths.is_faster_than(whole));
    }

    #[test]
    fn normalizes_to_unit_side_when_exact() {
        assert_eq!(ShutterSpeed::new(2, 1000).normalize(), (1, 500));
        assert_eq!(ShutterSpeed::new(300, 10).normalize(), (30, 1));
        assert_eq!(ShutterSpeed::new(13, 10).normalize(), (13, 10));
    }

    #[test]
    fn tenths_order_by_duration() {
        let one_three = ShutterSpeed::new(13, 10);
        let one = ShutterSpeed::new(10, 10);
        let point_eight = ShutterSpeed::new(8, 10);
        assert!(point_eight < one);
        assert!(one < one_three);
    }

    #[test]
    fn bulb_is_slowest() {
        assert!(ShutterSpeed::new(30, 1) < ShutterSpeed::BULB);
    }

    #[test]
    fn display_matches_camera_notation() {
        assert_eq!(ShutterSpeed::new(1, 4000).to_string(), "1/4000");
        assert_eq!(ShutterSpeed::new(300, 10).to_string(), "30\"");
        assert_eq!(ShutterSpeed::new(8, 10).to_string(), "0.8\"");
        assert_eq!(ShutterSpeed::new(2, 1).to_string(), "2\"");
        assert_eq!(ShutterSpeed::BULB.to_string(), "bulb");
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(a in any::<u32>(), b in any::<u32>()) {
            let (a, b) = (ShutterSpeed::from_raw(a), ShutterSpeed::from_raw(b));
            prop_assert_eq!(a.compare(b), b.compare(a).reverse());
            prop_assert_eq!(a.compare(b) == Ordering::Equal, a == b);
        }
    }
}
