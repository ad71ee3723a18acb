use crate::catalog::schema::Schema;
use crate::common::{page_size, PageId, Slot};
use crate::concurrency::TransactionId;
use crate::error::{DbError, DbResult};
use crate::tuple::value::Value;
use crate::tuple::Tuple;

/// A fixed-size slotted page holding tuples of a single schema.
///
/// Layout, front to back: a bitmap of `ceil(num_slots / 8)` bytes where
/// bit `i` (least-significant bit first within each byte) marks slot `i`
/// as used, followed by `num_slots` fixed-width tuple images. Any
/// trailing bytes are padding and round-trip unchanged.
///
/// The page edits its byte image in place, so serializing an untouched
/// page reproduces the input bytes exactly, including the contents of
/// unused slots.
pub struct HeapPage {
    pid: PageId,
    schema: Schema,
    data: Vec<u8>,
    dirty: Option<TransactionId>,
}

/// Number of slots that fit on a page: each tuple costs its image plus
/// one header bit.
pub fn slots_per_page(schema: &Schema) -> usize {
    (page_size() * 8) / (schema.tuple_size() * 8 + 1)
}

fn header_size(num_slots: usize) -> usize {
    num_slots.div_ceil(8)
}

impl HeapPage {
    /// Wraps a raw page image read from disk.
    pub fn new(pid: PageId, data: Vec<u8>, schema: Schema) -> DbResult<Self> {
        if data.len() != page_size() {
            return Err(DbError::invalid_page(pid));
        }
        Ok(Self {
            pid,
            schema,
            data,
            dirty: None,
        })
    }

    /// An all-zero page image: empty header bitmap, unspecified payload.
    pub fn create_empty_page_data() -> Vec<u8> {
        vec![0; page_size()]
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Serializes the page back to its on-disk image.
    pub fn page_data(&self) -> &[u8] {
        &self.data
    }

    pub fn num_slots(&self) -> usize {
        slots_per_page(&self.schema)
    }

    pub fn is_slot_used(&self, slot: Slot) -> bool {
        let slot = slot as usize;
        (self.data[slot / 8] >> (slot % 8)) & 1 == 1
    }

    fn set_slot(&mut self, slot: Slot, used: bool) {
        let slot = slot as usize;
        if used {
            self.data[slot / 8] |= 1 << (slot % 8);
        } else {
            self.data[slot / 8] &= !(1 << (slot % 8));
        }
    }

    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots() as Slot)
            .filter(|slot| !self.is_slot_used(*slot))
            .count()
    }

    fn slot_offset(&self, slot: Slot) -> usize {
        header_size(self.num_slots()) + slot as usize * self.schema.tuple_size()
    }

    /// Writes the tuple into the lowest free slot and stamps its record
    /// id. Fails with `SlotFull` if the page has no free slot.
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> DbResult<()> {
        let slot = (0..self.num_slots() as Slot)
            .find(|slot| !self.is_slot_used(*slot))
            .ok_or_else(|| DbError::slot_full(self.pid))?;

        let mut offset = self.slot_offset(slot);
        for value in tuple.values() {
            let size = value.type_id().field_size();
            value.serialize_value(&mut self.data[offset..offset + size]);
            offset += size;
        }
        self.set_slot(slot, true);
        tuple.set_record_id(Some((self.pid, slot)));
        Ok(())
    }

    /// Clears the header bit of the tuple's slot. The tuple bytes are
    /// retained; the image stays a valid page. Fails with
    /// `TupleNotFound` unless the tuple's record id refers to a used
    /// slot on this page.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let (pid, slot) = tuple.record_id().ok_or(DbError::TupleNotFound)?;
        if pid != self.pid || slot as usize >= self.num_slots() || !self.is_slot_used(slot) {
            return Err(DbError::TupleNotFound);
        }
        self.set_slot(slot, false);
        Ok(())
    }

    fn parse_tuple(&self, slot: Slot) -> Tuple {
        let mut offset = self.slot_offset(slot);
        let values = self
            .schema
            .columns()
            .iter()
            .map(|col| {
                let size = col.type_id().field_size();
                let value = Value::parse_value(&self.data[offset..offset + size], col.type_id());
                offset += size;
                value
            })
            .collect();
        let mut tuple = Tuple::new(values);
        tuple.set_record_id(Some((self.pid, slot)));
        tuple
    }

    /// Iterates the tuples of the used slots in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = Tuple> + '_ {
        (0..self.num_slots() as Slot)
            .filter(|slot| self.is_slot_used(*slot))
            .map(|slot| self.parse_tuple(slot))
    }

    pub fn mark_dirty(&mut self, dirty: Option<TransactionId>) {
        self.dirty = dirty;
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::{slots_per_page, HeapPage};
    use crate::catalog::schema::{ColumnDefinition, Schema, TypeId};
    use crate::common::page_size;
    use crate::concurrency::TransactionId;
    use crate::error::DbError;
    use crate::tuple::value::Value;
    use crate::tuple::Tuple;

    fn int_schema() -> Schema {
        Schema::new(vec![ColumnDefinition::new(TypeId::Integer, "number")])
    }

    fn two_column_schema() -> Schema {
        Schema::new(vec![
            ColumnDefinition::new(TypeId::Integer, "id"),
            ColumnDefinition::new(TypeId::Text, "name"),
        ])
    }

    #[test]
    fn slot_count_leaves_room_for_the_header() {
        // 4 byte tuples: floor(4096 * 8 / 33) slots
        assert_eq!(slots_per_page(&int_schema()), 992);
        // 4 + 4 + 128 byte tuples
        assert_eq!(slots_per_page(&two_column_schema()), 30);
    }

    #[test]
    fn insert_uses_lowest_free_slot() {
        let schema = int_schema();
        let data = HeapPage::create_empty_page_data();
        let mut page = HeapPage::new((1, 0), data, schema).unwrap();

        let mut first = Tuple::new(vec![Value::Integer(1)]);
        let mut second = Tuple::new(vec![Value::Integer(2)]);
        page.insert_tuple(&mut first).unwrap();
        page.insert_tuple(&mut second).unwrap();
        assert_eq!(first.record_id(), Some(((1, 0), 0)));
        assert_eq!(second.record_id(), Some(((1, 0), 1)));

        page.delete_tuple(&first).unwrap();
        let mut third = Tuple::new(vec![Value::Integer(3)]);
        page.insert_tuple(&mut third).unwrap();
        assert_eq!(third.record_id(), Some(((1, 0), 0)));
    }

    #[test]
    fn full_page_rejects_inserts() {
        let schema = two_column_schema();
        let mut page =
            HeapPage::new((1, 0), HeapPage::create_empty_page_data(), schema).unwrap();

        for i in 0..page.num_slots() {
            let mut tuple = Tuple::new(vec![
                Value::Integer(i as i32),
                Value::String(format!("row {}", i)),
            ]);
            page.insert_tuple(&mut tuple).unwrap();
        }
        assert_eq!(page.num_empty_slots(), 0);

        let mut overflow = Tuple::new(vec![Value::Integer(-1), Value::String("x".to_owned())]);
        assert!(matches!(
            page.insert_tuple(&mut overflow),
            Err(DbError::SlotFull(1, 0))
        ));
    }

    #[test]
    fn delete_requires_a_matching_record_id() {
        let schema = int_schema();
        let mut page =
            HeapPage::new((1, 0), HeapPage::create_empty_page_data(), schema.clone()).unwrap();

        let unplaced = Tuple::new(vec![Value::Integer(7)]);
        assert!(matches!(
            page.delete_tuple(&unplaced),
            Err(DbError::TupleNotFound)
        ));

        let mut other_page = Tuple::new(vec![Value::Integer(7)]);
        let mut foreign = HeapPage::new((1, 1), HeapPage::create_empty_page_data(), schema).unwrap();
        foreign.insert_tuple(&mut other_page).unwrap();
        assert!(matches!(
            page.delete_tuple(&other_page),
            Err(DbError::TupleNotFound)
        ));

        let mut tuple = Tuple::new(vec![Value::Integer(7)]);
        page.insert_tuple(&mut tuple).unwrap();
        page.delete_tuple(&tuple).unwrap();
        // the slot is free again, a second delete must fail
        assert!(matches!(
            page.delete_tuple(&tuple),
            Err(DbError::TupleNotFound)
        ));
    }

    #[test]
    fn iterator_returns_used_slots_in_order() {
        let schema = int_schema();
        let mut page =
            HeapPage::new((1, 0), HeapPage::create_empty_page_data(), schema).unwrap();

        for i in 0..10 {
            let mut tuple = Tuple::new(vec![Value::Integer(i)]);
            page.insert_tuple(&mut tuple).unwrap();
        }
        let third = page.iter().nth(3).unwrap();
        page.delete_tuple(&third).unwrap();

        let numbers: Vec<i32> = page.iter().map(|tuple| tuple.as_i32(0)).collect();
        assert_eq!(numbers, vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn untouched_pages_round_trip_bit_exactly() {
        // garbage in unused slots and padding must survive a parse/serialize cycle
        let mut data = vec![0u8; page_size()];
        rand::thread_rng().fill(data.as_mut_slice());
        // clear the header bitmap so no slot is considered used
        let schema = two_column_schema();
        let header_bytes = slots_per_page(&schema).div_ceil(8);
        data[..header_bytes].fill(0);

        let page = HeapPage::new((1, 0), data.clone(), schema).unwrap();
        assert_eq!(page.page_data(), data.as_slice());
        assert_eq!(page.iter().count(), 0);
    }

    #[test]
    fn deleted_tuple_bytes_are_retained() {
        let schema = int_schema();
        let mut page =
            HeapPage::new((1, 0), HeapPage::create_empty_page_data(), schema).unwrap();
        let mut tuple = Tuple::new(vec![Value::Integer(99)]);
        page.insert_tuple(&mut tuple).unwrap();
        let before = page.page_data().to_vec();

        page.delete_tuple(&tuple).unwrap();
        let after = page.page_data();
        // only the header bit may change
        assert_ne!(before.as_slice(), after);
        assert_eq!(&before[1..], &after[1..]);
    }

    #[test]
    fn dirty_marking_tracks_the_owner() {
        let schema = int_schema();
        let mut page =
            HeapPage::new((1, 0), HeapPage::create_empty_page_data(), schema).unwrap();
        assert_eq!(page.is_dirty(), None);

        let tid = TransactionId::new();
        page.mark_dirty(Some(tid));
        assert_eq!(page.is_dirty(), Some(tid));
        page.mark_dirty(None);
        assert_eq!(page.is_dirty(), None);
    }
}
