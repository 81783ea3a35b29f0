/// Free list of reusable values. Released values are reset before they are handed out again.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { free: Vec::new() }
    }
}

pub trait Reset {
    fn reset(&mut self);
}

impl<T: Default + Reset> Pool<T> {
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    pub fn release(&mut self, mut value: T) {
        value.reset();
        self.free.push(value);
    }

    pub fn release_all(&mut self, values: impl IntoIterator<Item = T>) {
        for value in values {
            self.release(value);
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Item(u32);

    impl Reset for Item {
        fn reset(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn released_items_are_reset_and_reused() {
        let mut pool = Pool::<Item>::default();
        assert_eq!(pool.acquire(), Item(0));

        pool.release_all([Item(3), Item(4)]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.acquire(), Item(0));
        assert_eq!(pool.len(), 1);
    }
}
