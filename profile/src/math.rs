use num_traits::Float;

pub(crate) fn lerp<T>(a: T, b: T, t: T) -> T
where
    T: Float,
{
    a + (b - a) * t
}

/// Value at `x` on the line through `(start, v0)` and `(start + len, v1)`.
pub(crate) fn span_value<T>(start: T, len: T, v0: T, v1: T, x: T) -> T
where
    T: Float,
{
    if len == T::zero() {
        return v0;
    }
    lerp(v0, v1, (x - start) / len)
}
