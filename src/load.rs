#![allow(non_snake_case)]

use crate::prelude::*;

/// External force vector as a deterministic function of time.
pub trait Load {
    /// Write the force at time `t` into `F`, which has length ndofs.
    fn load_into(&self, t: f64, F: &mut VectorD) -> Result<()>;
}

impl<G> Load for G
where
    G: Fn(f64) -> VectorD,
{
    fn load_into(&self, t: f64, F: &mut VectorD) -> Result<()> {
        let f = self(t);
        if f.len() != F.len() {
            return Err(Error::DimensionMismatch {
                what: "load vector",
                expected: F.len(),
                found: f.len(),
            });
        }
        F.copy_from(&f);
        Ok(())
    }
}

/// Unloaded system
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroLoad;

impl Load for ZeroLoad {
    fn load_into(&self, _t: f64, F: &mut VectorD) -> Result<()> {
        F.fill(0.);
        Ok(())
    }
}

/// Fixed load pattern scaled by a time multiplier, `F(t) = multiplier(t) * pattern`.
#[derive(Debug, Clone)]
pub struct ScaledLoad<G> {
    pub pattern: VectorD,
    pub multiplier: G,
}

impl<G> ScaledLoad<G>
where
    G: Fn(f64) -> f64,
{
    pub fn new(pattern: VectorD, multiplier: G) -> Self {
        ScaledLoad {
            pattern,
            multiplier,
        }
    }
}

impl<G> Load for ScaledLoad<G>
where
    G: Fn(f64) -> f64,
{
    fn load_into(&self, t: f64, F: &mut VectorD) -> Result<()> {
        if self.pattern.len() != F.len() {
            return Err(Error::DimensionMismatch {
                what: "load pattern",
                expected: F.len(),
                found: self.pattern.len(),
            });
        }
        F.copy_from(&self.pattern);
        F.scale_mut((self.multiplier)(t));
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_closure_load() {
        let load = |t: f64| VectorD::from_vec(vec![t, 2. * t]);
        let mut F = VectorD::zeros(2);
        load.load_into(1.5, &mut F).unwrap();
        assert_relative_eq!(F, VectorD::from_vec(vec![1.5, 3.]));

        let mut F = VectorD::zeros(3);
        assert!(matches!(
            load.load_into(1.5, &mut F),
            Err(Error::DimensionMismatch { found: 2, .. })
        ));
    }

    #[test]
    fn test_scaled_load() {
        let load = ScaledLoad::new(VectorD::from_vec(vec![0., 1., -2.]), |t: f64| 3. * t);
        let mut F = VectorD::from_element(3, 7.);
        load.load_into(2., &mut F).unwrap();
        assert_relative_eq!(F, VectorD::from_vec(vec![0., 6., -12.]));
    }

    #[test]
    fn test_zero_load() {
        let mut F = VectorD::from_element(4, 1.);
        ZeroLoad.load_into(10., &mut F).unwrap();
        assert_eq!(F, VectorD::zeros(4));
    }
}
