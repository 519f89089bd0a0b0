use std::any::type_name;

pub fn pretty_type_name<'a, T>() -> &'a str {
    type_name::<T>().split("::").last().unwrap()
}

pub trait AndIf<F> {
    fn and_if(self, condition: bool, then: F) -> Self;
}

impl<T, F> AndIf<F> for T
where
    F: FnOnce(Self) -> Self,
{
    fn and_if(self, condition: bool, then: F) -> Self {
        let mut obj = self;
        if condition {
            obj = then(obj);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_type_name_strips_the_module_path() {
        assert_eq!(pretty_type_name::<Vec<u8>>(), "Vec<u8>");
    }
}
