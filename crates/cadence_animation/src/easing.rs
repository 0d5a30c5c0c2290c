//! Easing functions for animations
//!
//! Every variant maps a normalized ratio to an eased ratio. Inputs are not
//! clamped: callers may extrapolate outside `[0, 1]`.

use std::f64::consts::PI;

/// Easing function type
#[derive(Clone, Copy, Debug, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// Quadratic-ish ease with strength in `[-1, 1]`: negative eases in,
    /// positive eases out
    Amount(f64),
    PowIn(f64),
    PowOut(f64),
    PowInOut(f64),
    SineIn,
    SineOut,
    SineInOut,
    /// Overshoot below zero before heading to the end
    BackIn(f64),
    BackOut(f64),
    BackInOut(f64),
    CircIn,
    CircOut,
    CircInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
    ElasticIn { amplitude: f64, period: f64 },
    ElasticOut { amplitude: f64, period: f64 },
    ElasticInOut { amplitude: f64, period: f64 },
    /// CSS-style cubic bezier through (0,0), (x1,y1), (x2,y2), (1,1)
    CubicBezier(f64, f64, f64, f64),
    Custom(fn(f64) -> f64),
}

impl Easing {
    pub const QUAD_IN: Easing = Easing::PowIn(2.0);
    pub const QUAD_OUT: Easing = Easing::PowOut(2.0);
    pub const QUAD_IN_OUT: Easing = Easing::PowInOut(2.0);
    pub const CUBIC_IN: Easing = Easing::PowIn(3.0);
    pub const CUBIC_OUT: Easing = Easing::PowOut(3.0);
    pub const CUBIC_IN_OUT: Easing = Easing::PowInOut(3.0);
    pub const QUART_IN: Easing = Easing::PowIn(4.0);
    pub const QUART_OUT: Easing = Easing::PowOut(4.0);
    pub const QUART_IN_OUT: Easing = Easing::PowInOut(4.0);
    pub const QUINT_IN: Easing = Easing::PowIn(5.0);
    pub const QUINT_OUT: Easing = Easing::PowOut(5.0);
    pub const QUINT_IN_OUT: Easing = Easing::PowInOut(5.0);
    pub const BACK_IN: Easing = Easing::BackIn(1.7);
    pub const BACK_OUT: Easing = Easing::BackOut(1.7);
    pub const BACK_IN_OUT: Easing = Easing::BackInOut(1.7);
    pub const ELASTIC_IN: Easing = Easing::ElasticIn {
        amplitude: 1.0,
        period: 0.3,
    };
    pub const ELASTIC_OUT: Easing = Easing::ElasticOut {
        amplitude: 1.0,
        period: 0.3,
    };
    pub const ELASTIC_IN_OUT: Easing = Easing::ElasticInOut {
        amplitude: 1.0,
        period: 0.3 * 1.5,
    };

    /// Strength-based ease, clamped to `[-1, 1]`
    pub fn amount(amount: f64) -> Self {
        Easing::Amount(amount.clamp(-1.0, 1.0))
    }

    pub fn pow_in(pow: f64) -> Self {
        Easing::PowIn(pow)
    }

    pub fn pow_out(pow: f64) -> Self {
        Easing::PowOut(pow)
    }

    pub fn pow_in_out(pow: f64) -> Self {
        Easing::PowInOut(pow)
    }

    pub fn back_in(amount: f64) -> Self {
        Easing::BackIn(amount)
    }

    pub fn back_out(amount: f64) -> Self {
        Easing::BackOut(amount)
    }

    pub fn back_in_out(amount: f64) -> Self {
        Easing::BackInOut(amount)
    }

    pub fn elastic_in(amplitude: f64, period: f64) -> Self {
        Easing::ElasticIn { amplitude, period }
    }

    pub fn elastic_out(amplitude: f64, period: f64) -> Self {
        Easing::ElasticOut { amplitude, period }
    }

    pub fn elastic_in_out(amplitude: f64, period: f64) -> Self {
        Easing::ElasticInOut { amplitude, period }
    }

    /// Apply the easing function to a ratio
    pub fn apply(&self, t: f64) -> f64 {
        match *self {
            Easing::Linear => t,
            Easing::Amount(amount) => {
                if amount == 0.0 {
                    t
                } else if amount < 0.0 {
                    t * (t * -amount + 1.0 + amount)
                } else {
                    t * ((2.0 - t) * amount + (1.0 - amount))
                }
            }
            Easing::PowIn(pow) => t.powf(pow),
            Easing::PowOut(pow) => 1.0 - (1.0 - t).powf(pow),
            Easing::PowInOut(pow) => {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t.powf(pow)
                } else {
                    1.0 - 0.5 * (2.0 - t).powf(pow).abs()
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -0.5 * ((PI * t).cos() - 1.0),
            Easing::BackIn(amount) => t * t * ((amount + 1.0) * t - amount),
            Easing::BackOut(amount) => {
                let t = t - 1.0;
                t * t * ((amount + 1.0) * t + amount) + 1.0
            }
            Easing::BackInOut(amount) => {
                let amount = amount * 1.525;
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * (t * t * ((amount + 1.0) * t - amount))
                } else {
                    let t = t - 2.0;
                    0.5 * (t * t * ((amount + 1.0) * t + amount) + 2.0)
                }
            }
            Easing::CircIn => -((1.0 - t * t).sqrt() - 1.0),
            Easing::CircOut => {
                let t = t - 1.0;
                (1.0 - t * t).sqrt()
            }
            Easing::CircInOut => {
                let t = t * 2.0;
                if t < 1.0 {
                    -0.5 * ((1.0 - t * t).sqrt() - 1.0)
                } else {
                    let t = t - 2.0;
                    0.5 * ((1.0 - t * t).sqrt() + 1.0)
                }
            }
            Easing::BounceIn => bounce_in(t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    bounce_in(t * 2.0) * 0.5
                } else {
                    bounce_out(t * 2.0 - 1.0) * 0.5 + 0.5
                }
            }
            Easing::ElasticIn { amplitude, period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let s = elastic_phase(amplitude, period);
                let t = t - 1.0;
                -(amplitude * 2f64.powf(10.0 * t) * ((t - s) * 2.0 * PI / period).sin())
            }
            Easing::ElasticOut { amplitude, period } => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let s = elastic_phase(amplitude, period);
                amplitude * 2f64.powf(-10.0 * t) * ((t - s) * 2.0 * PI / period).sin() + 1.0
            }
            Easing::ElasticInOut { amplitude, period } => {
                let s = elastic_phase(amplitude, period);
                let t = t * 2.0;
                if t < 1.0 {
                    let t = t - 1.0;
                    -0.5 * (amplitude * 2f64.powf(10.0 * t) * ((t - s) * 2.0 * PI / period).sin())
                } else {
                    let t = t - 1.0;
                    amplitude * 2f64.powf(-10.0 * t) * ((t - s) * 2.0 * PI / period).sin() * 0.5 + 1.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, x1, y1, x2, y2),
            Easing::Custom(f) => f(t),
        }
    }
}

fn elastic_phase(amplitude: f64, period: f64) -> f64 {
    period / (2.0 * PI) * (1.0 / amplitude).asin()
}

fn bounce_in(t: f64) -> f64 {
    1.0 - bounce_out(1.0 - t)
}

fn bounce_out(t: f64) -> f64 {
    if t < 1.0 / 2.75 {
        7.5625 * t * t
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        7.5625 * t * t + 0.75
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        7.5625 * t * t + 0.9375
    } else {
        let t = t - 2.625 / 2.75;
        7.5625 * t * t + 0.984375
    }
}

/// Cubic bezier easing calculation (matches CSS / browser implementations).
///
/// Newton-Raphson with a binary-search fallback when the slope flattens.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let mut p = t;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - t;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = t;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - t).abs() < 1e-7 {
            break;
        }
        if val < t {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2)
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}
