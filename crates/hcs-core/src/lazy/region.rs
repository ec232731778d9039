use ndarray::{ArrayBase, ArrayViewD, Data, IxDyn, Slice};

/// Axis-aligned hyper-rectangle inside an n-dimensional array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub start: Vec<usize>,
    pub shape: Vec<usize>,
}

impl Region {
    pub fn new(start: Vec<usize>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(start.len(), shape.len());
        Self { start, shape }
    }

    /// The region covering a whole array of `shape`.
    pub fn full(shape: &[usize]) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape: shape.to_vec(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Exclusive end along `axis`.
    pub fn end(&self, axis: usize) -> usize {
        self.start[axis] + self.shape[axis]
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&s| s == 0)
    }

    /// True if `self` lies entirely inside an array of `shape`.
    pub fn fits_in(&self, shape: &[usize]) -> bool {
        self.ndim() == shape.len() && (0..self.ndim()).all(|a| self.end(a) <= shape[a])
    }

    /// Split an array of `shape` into a row-major grid of `chunks`-sized
    /// regions. Edge regions are clipped to the array bounds.
    pub fn grid(shape: &[usize], chunks: &[usize]) -> Vec<Region> {
        debug_assert_eq!(shape.len(), chunks.len());
        if shape.iter().any(|&s| s == 0) {
            return Vec::new();
        }
        let counts: Vec<usize> = shape
            .iter()
            .zip(chunks)
            .map(|(&s, &c)| s.div_ceil(c.max(1)))
            .collect();
        let total: usize = counts.iter().product();
        let mut regions = Vec::with_capacity(total);
        let mut index = vec![0usize; shape.len()];
        for _ in 0..total {
            let start: Vec<usize> = index.iter().zip(chunks).map(|(&i, &c)| i * c).collect();
            let extent: Vec<usize> = start
                .iter()
                .zip(chunks)
                .zip(shape)
                .map(|((&s, &c), &n)| c.min(n - s))
                .collect();
            regions.push(Region::new(start, extent));

            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < counts[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        regions
    }

    /// View of `self` inside `array`.
    pub fn view<'a, S, A>(&self, array: &'a ArrayBase<S, IxDyn>) -> ArrayViewD<'a, A>
    where
        S: Data<Elem = A>,
    {
        array.slice_each_axis(|ax| {
            let a = ax.axis.index();
            Slice::from(self.start[a]..self.end(a))
        })
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = (0..self.ndim())
            .map(|a| format!("{}..{}", self.start[a], self.end(a)))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
