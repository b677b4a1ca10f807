/// Implements the standard arithmetic operator traits for single-field tuple
/// newtypes by forwarding to the inner value.
///
/// Three forms are supported:
/// * `op!(binary T, Add, add)` for `T op T -> T` operators,
/// * `op!(inplace T, AddAssign, add_assign)` for `T op= T` operators,
/// * `op!(unary T, Neg, neg)` for prefix operators.
#[macro_export]
macro_rules! op {
    (binary $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            fn $method(&mut self, rhs: Self) {
                std::ops::$trait::$method(&mut self.0, rhs.0)
            }
        }
    };
    (unary $ty:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $ty {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0))
            }
        }
    };
}
