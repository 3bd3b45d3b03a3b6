use crate::errors::DataProcessingError;
use serde::{
    Deserialize,
    Serialize,
};

/// A centroided MS2 spectrum, as provided by a spectrum reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ms2Scan {
    /// One-based scan number.
    pub scan_id: u32,
    /// Peak m/z values, ascending.
    pub mz: Vec<f64>,
    pub intensity: Vec<f32>,
    /// Neutral (uncharged) precursor mass.
    pub precursor_mass: f64,
    pub total_ion_current: f64,
    pub precursor_charge: Option<u8>,
    pub retention_time_seconds: Option<f32>,
}

impl Ms2Scan {
    /// Validates the peak arrays and computes the total ion current as the
    /// sum of intensities.
    pub fn try_new(
        scan_id: u32,
        mz: Vec<f64>,
        intensity: Vec<f32>,
        precursor_mass: f64,
    ) -> Result<Self, DataProcessingError> {
        if mz.len() != intensity.len() {
            return Err(DataProcessingError::ExpectedSlicesSameLength {
                expected: mz.len(),
                other: intensity.len(),
                context: format!("peaks of scan {}", scan_id),
            });
        }
        if !precursor_mass.is_finite()
            || mz.iter().any(|x| !x.is_finite())
            || intensity.iter().any(|x| !x.is_finite())
        {
            return Err(DataProcessingError::ExpectedFiniteNonNanData {
                context: format!("scan {}", scan_id),
            });
        }
        if mz.windows(2).any(|w| w[0] > w[1]) {
            return Err(DataProcessingError::ExpectedSortedData {
                context: format!("m/z values of scan {}", scan_id),
            });
        }
        let total_ion_current = intensity.iter().map(|x| *x as f64).sum();
        Ok(Self {
            scan_id,
            mz,
            intensity,
            precursor_mass,
            total_ion_current,
            precursor_charge: None,
            retention_time_seconds: None,
        })
    }

    pub fn with_total_ion_current(mut self, tic: f64) -> Self {
        self.total_ion_current = tic;
        self
    }

    pub fn with_precursor_charge(mut self, charge: u8) -> Self {
        self.precursor_charge = Some(charge);
        self
    }

    pub fn with_retention_time(mut self, seconds: f32) -> Self {
        self.retention_time_seconds = Some(seconds);
        self
    }

    pub fn num_peaks(&self) -> usize {
        self.mz.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_validation() {
        let scan = Ms2Scan::try_new(1, vec![100.0, 200.0], vec![1.0, 3.0], 500.0).unwrap();
        assert_eq!(scan.total_ion_current, 4.0);
        assert_eq!(scan.num_peaks(), 2);

        assert!(matches!(
            Ms2Scan::try_new(2, vec![100.0], vec![1.0, 3.0], 500.0),
            Err(DataProcessingError::ExpectedSlicesSameLength { .. })
        ));
        assert!(matches!(
            Ms2Scan::try_new(3, vec![200.0, 100.0], vec![1.0, 3.0], 500.0),
            Err(DataProcessingError::ExpectedSortedData { .. })
        ));
        assert!(matches!(
            Ms2Scan::try_new(4, vec![100.0], vec![f32::NAN], 500.0),
            Err(DataProcessingError::ExpectedFiniteNonNanData { .. })
        ));
    }
}
