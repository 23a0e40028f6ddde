#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    pub fn from_slice(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of rows, i.e. the leading dimension (0 for scalars)
    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Elements per row: the product of all trailing dimensions
    pub fn row_size(&self) -> usize {
        self.dims.iter().skip(1).product()
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_and_row_size() {
        let shape = Shape::from_slice(&[5, 256, 7, 7]);
        assert_eq!(shape.rows(), 5);
        assert_eq!(shape.row_size(), 256 * 49);
        assert_eq!(shape.size(), 5 * 256 * 49);
        assert_eq!(shape.to_string(), "[5, 256, 7, 7]");
    }
}
