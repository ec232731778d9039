use crate::element::Element;
use crate::error::{HcsError, Result};
use crate::lazy::LazyArray;

/// Block-mean the trailing two axes by `factor`; `1` returns the image as is.
pub fn bin_yx<T: Element>(image: &LazyArray<T>, factor: usize) -> Result<LazyArray<T>> {
    match factor {
        0 => Err(HcsError::config("yx_binning must be an integer >= 1")),
        1 => Ok(image.clone()),
        _ => image.coarsen_yx(factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_identity_keeps_graph() {
        let image = LazyArray::<u16>::zeros(&[1, 1, 1, 5, 5], &[1, 1, 1, 5, 5]).unwrap();
        let binned = bin_yx(&image, 1).unwrap();
        assert_eq!(binned.graph(), image.graph());
    }

    #[test]
    fn test_bin_discards_incomplete_blocks() {
        let data = ArrayD::from_elem(IxDyn(&[1, 1, 1, 7, 9]), 3u16);
        let image = LazyArray::from_array(data, &[1, 1, 1, 4, 4]).unwrap();
        let binned = bin_yx(&image, 2).unwrap();
        assert_eq!(binned.shape(), &[1, 1, 1, 3, 4]);
        assert!(binned.compute().unwrap().iter().all(|&v| v == 3));
    }

    #[test]
    fn test_zero_factor() {
        let image = LazyArray::<u16>::zeros(&[4, 4], &[2, 2]).unwrap();
        assert!(bin_yx(&image, 0).unwrap_err().is_configuration());
    }
}
