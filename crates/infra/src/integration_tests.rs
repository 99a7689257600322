//! End-to-end tests for reservation, production sync and stock queries.
//!
//! Tests: reserve → sync production → reservation tracker → movement ledger
//!
//! Verifies:
//! - Reservations close exactly when cumulative consumption reaches them
//! - Resyncing a production event replaces its movements instead of piling up
//! - Consumed raw material is conserved across any silo split

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use plantledger_inventory::{
        BlockProduction, BlockProductionId, BlockTypeId, Direction, ItemRef, LocationRef,
        MoldTypeId, MoldedProduction, MoldedProductionId, Movement, MovementReference,
        ProductionEvent, ProductionPointing, ProductionPointingId, RawMaterialId, ReservationStatus, SiloId,
        WarehouseId,
    };

    use crate::production_sync::InventoryService;
    use crate::store::InMemoryLedgerStore;

    fn setup() -> InventoryService<InMemoryLedgerStore> {
        InventoryService::new(InMemoryLedgerStore::new())
    }

    fn pointing(quantity: Decimal) -> ProductionPointing {
        ProductionPointing {
            id: ProductionPointingId::new(),
            raw_material_id: Some(RawMaterialId::new()),
            quantity_kg: Some(quantity),
        }
    }

    fn block(pointing: &ProductionPointing, weight: Decimal, silos: Vec<SiloId>) -> BlockProduction {
        BlockProduction {
            id: BlockProductionId::new(),
            pointing: pointing.clone(),
            block_type_id: BlockTypeId::new(),
            weight_kg: weight,
            is_scrap: false,
            silos,
            warehouse_id: None,
            produced_at: Utc::now(),
        }
    }

    fn sum(movements: &[Movement], direction: Direction) -> Decimal {
        movements
            .iter()
            .filter(|m| m.direction == direction)
            .map(|m| m.quantity)
            .sum()
    }

    fn count(movements: &[Movement], direction: Direction) -> usize {
        movements.iter().filter(|m| m.direction == direction).count()
    }

    fn raw_material(pointing: &ProductionPointing) -> RawMaterialId {
        pointing.raw_material_id.unwrap()
    }

    #[tokio::test]
    async fn block_production_consumes_full_reservation_across_two_silos() {
        let service = setup();
        let pointing = pointing(dec!(500));
        let silos = vec![SiloId::new(), SiloId::new()];

        let reservation = service
            .reserve_for_production_pointing(&pointing, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reservation.reserved_kg(), dec!(500));
        assert_eq!(reservation.status(), ReservationStatus::Active);

        let block = block(&pointing, dec!(500), silos.clone());
        let outcome = service.sync_block_production(&block, None).await.unwrap();

        let outs: Vec<_> = outcome
            .movements
            .iter()
            .filter(|m| m.direction == Direction::Out)
            .collect();
        assert_eq!(outs.len(), 2);
        for (movement, silo) in outs.iter().zip(&silos) {
            assert_eq!(movement.quantity, dec!(250));
            assert_eq!(movement.location, Some(LocationRef::Silo(*silo)));
            assert_eq!(movement.item, ItemRef::RawMaterial(raw_material(&pointing)));
        }

        assert_eq!(count(&outcome.movements, Direction::In), 1);
        assert_eq!(sum(&outcome.movements, Direction::In), dec!(500));

        let reservation = service.reservation_for(pointing.id).await.unwrap().unwrap();
        assert_eq!(reservation.consumed_kg(), dec!(500));
        assert_eq!(reservation.status(), ReservationStatus::Closed);
        assert_eq!(outcome.reservation, Some(reservation));
    }

    #[tokio::test]
    async fn resyncing_an_unchanged_block_yields_the_same_movements() {
        let service = setup();
        let pointing = pointing(dec!(1000));
        let block = block(&pointing, dec!(300), vec![SiloId::new(), SiloId::new(), SiloId::new()]);

        let first = service.sync_block_production(&block, None).await.unwrap();
        let second = service.sync_block_production(&block, None).await.unwrap();

        assert_eq!(first.movements.len(), second.movements.len());
        let quantities = |ms: &[Movement]| ms.iter().map(|m| (m.direction, m.quantity)).collect::<Vec<_>>();
        assert_eq!(quantities(&first.movements), quantities(&second.movements));

        let stored = service.movements_for(block.reference()).await.unwrap();
        assert_eq!(stored, second.movements);
        assert_eq!(service.store().movement_count().await, 4);
    }

    #[tokio::test]
    async fn production_without_silos_books_one_location_less_out() {
        let service = setup();
        let pointing = pointing(dec!(80));
        let block = block(&pointing, dec!(77.7), Vec::new());

        let outcome = service.sync_block_production(&block, None).await.unwrap();

        assert_eq!(count(&outcome.movements, Direction::Out), 1);
        let out = outcome
            .movements
            .iter()
            .find(|m| m.direction == Direction::Out)
            .unwrap();
        assert_eq!(out.location, None);
        assert_eq!(out.quantity, dec!(77.7));
    }

    #[tokio::test]
    async fn uneven_split_still_conserves_consumption() {
        let service = setup();
        let pointing = pointing(dec!(100));
        let silos: Vec<SiloId> = (0..3).map(|_| SiloId::new()).collect();
        let block = block(&pointing, dec!(100), silos);

        let outcome = service.sync_block_production(&block, None).await.unwrap();

        assert_eq!(sum(&outcome.movements, Direction::Out), dec!(100));
        assert!(outcome.movements.iter().all(|m| m.quantity > Decimal::ZERO));
    }

    #[tokio::test]
    async fn scrap_block_adjusts_instead_of_receiving() {
        let service = setup();
        let pointing = pointing(dec!(100));
        let mut block = block(&pointing, dec!(40), vec![SiloId::new()]);
        block.is_scrap = true;

        let scrap = service.sync_block_production(&block, None).await.unwrap();
        assert_eq!(count(&scrap.movements, Direction::In), 0);
        assert_eq!(count(&scrap.movements, Direction::Adjust), 1);
        assert_eq!(sum(&scrap.movements, Direction::Adjust), dec!(-40));

        block.is_scrap = false;
        let good = service.sync_block_production(&block, None).await.unwrap();
        assert_eq!(count(&good.movements, Direction::In), 1);
        assert_eq!(count(&good.movements, Direction::Adjust), 0);
        assert_eq!(service.movements_for(block.reference()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reservation_closes_at_exact_cumulative_consumption() {
        let service = setup();
        let pointing = pointing(dec!(100));
        service.reserve_for_production_pointing(&pointing, None).await.unwrap();

        service
            .sync_block_production(&block(&pointing, dec!(60), vec![SiloId::new()]), None)
            .await
            .unwrap();
        let reservation = service.reservation_for(pointing.id).await.unwrap().unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Active);

        service
            .sync_block_production(&block(&pointing, dec!(40), vec![SiloId::new()]), None)
            .await
            .unwrap();
        let reservation = service.reservation_for(pointing.id).await.unwrap().unwrap();
        assert_eq!(reservation.consumed_kg(), dec!(100));
        assert_eq!(reservation.status(), ReservationStatus::Closed);
    }

    #[tokio::test]
    async fn reservation_stays_active_just_below_reserved() {
        let service = setup();
        let pointing = pointing(dec!(100));
        service.reserve_for_production_pointing(&pointing, None).await.unwrap();

        for weight in [dec!(99), dec!(0.5)] {
            service
                .sync_block_production(&block(&pointing, weight, vec![SiloId::new()]), None)
                .await
                .unwrap();
        }

        let reservation = service.reservation_for(pointing.id).await.unwrap().unwrap();
        assert_eq!(reservation.consumed_kg(), dec!(99.5));
        assert_eq!(reservation.status(), ReservationStatus::Active);
        assert_eq!(reservation.remaining_kg(), dec!(0.5));
    }

    #[tokio::test]
    async fn re_reserving_replaces_the_reserve_movement() {
        let service = setup();
        let mut pointing = pointing(dec!(200));
        let reference = MovementReference::ProductionPointing(pointing.id);

        service.reserve_for_production_pointing(&pointing, None).await.unwrap();
        pointing.quantity_kg = Some(dec!(250));
        let reservation = service
            .reserve_for_production_pointing(&pointing, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reservation.reserved_kg(), dec!(250));
        let movements = service.movements_for(reference).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].direction, Direction::Reserve);
        assert_eq!(movements[0].quantity, dec!(250));
    }

    #[tokio::test]
    async fn switching_raw_material_moves_the_reservation() {
        let service = setup();
        let mut pointing = pointing(dec!(200));
        service.reserve_for_production_pointing(&pointing, None).await.unwrap();

        let replacement = RawMaterialId::new();
        pointing.raw_material_id = Some(replacement);
        let reservation = service
            .reserve_for_production_pointing(&pointing, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reservation.raw_material_id(), replacement);
        let movements = service
            .movements_for(MovementReference::ProductionPointing(pointing.id))
            .await
            .unwrap();
        assert_eq!(movements[0].item, ItemRef::RawMaterial(replacement));
    }

    #[tokio::test]
    async fn unconfigured_pointing_is_skipped() {
        let service = setup();
        let mut pointing = pointing(dec!(10));
        pointing.raw_material_id = None;
        assert!(service.reserve_for_production_pointing(&pointing, None).await.unwrap().is_none());

        let mut zero = self::pointing(dec!(1));
        zero.quantity_kg = Some(Decimal::ZERO);
        assert!(service.reserve_for_production_pointing(&zero, None).await.unwrap().is_none());

        assert_eq!(service.store().movement_count().await, 0);
    }

    #[tokio::test]
    async fn production_without_raw_material_only_records_output() {
        let service = setup();
        let mut pointing = pointing(dec!(10));
        pointing.raw_material_id = None;
        let block = block(&pointing, dec!(25), vec![SiloId::new()]);

        let outcome = service.sync_block_production(&block, None).await.unwrap();

        assert_eq!(outcome.movements.len(), 1);
        assert_eq!(outcome.movements[0].direction, Direction::In);
        assert!(outcome.reservation.is_none());
        assert!(service.reservation_for(pointing.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn molded_production_consumes_and_receives_parts() {
        let service = setup();
        let pointing = pointing(dec!(120));
        let warehouse = WarehouseId::new();
        service.reserve_for_production_pointing(&pointing, None).await.unwrap();

        let molded = MoldedProduction {
            id: MoldedProductionId::new(),
            pointing: pointing.clone(),
            mold_type_id: MoldTypeId::new(),
            total_weight_considered_kg: dec!(45.5),
            pieces: 120,
            silos: vec![SiloId::new(), SiloId::new()],
            warehouse_id: Some(warehouse),
            produced_at: Utc::now(),
        };
        let outcome = service.sync_molded_production(&molded, None).await.unwrap();

        assert_eq!(sum(&outcome.movements, Direction::Out), dec!(45.5));
        let received = outcome
            .movements
            .iter()
            .find(|m| m.direction == Direction::In)
            .unwrap();
        assert_eq!(received.item, ItemRef::MoldType(molded.mold_type_id));
        assert_eq!(received.location, Some(LocationRef::Warehouse(warehouse)));
        assert_eq!(received.quantity, dec!(45.5));

        let reservation = outcome.reservation.unwrap();
        assert_eq!(reservation.consumed_kg(), dec!(45.5));
        assert!(!reservation.is_closed());
    }

    #[tokio::test]
    async fn stock_on_hand_folds_the_ledger() {
        let service = setup();
        let pointing = pointing(dec!(100));
        let warehouse = WarehouseId::new();
        service.reserve_for_production_pointing(&pointing, None).await.unwrap();

        let mut good = block(&pointing, dec!(30), vec![SiloId::new()]);
        good.warehouse_id = Some(warehouse);
        let mut scrap = block(&pointing, dec!(5), vec![SiloId::new()]);
        scrap.block_type_id = good.block_type_id;
        scrap.warehouse_id = Some(warehouse);
        scrap.is_scrap = true;

        service.sync_block_production(&good, None).await.unwrap();
        service.sync_block_production(&scrap, None).await.unwrap();

        let blocks = ItemRef::BlockType(good.block_type_id);
        assert_eq!(service.stock_on_hand(blocks, None).await.unwrap(), dec!(25));
        assert_eq!(
            service
                .stock_on_hand(blocks, Some(LocationRef::Warehouse(warehouse)))
                .await
                .unwrap(),
            dec!(25)
        );

        // reserve movements never touch on-hand stock
        let raw = ItemRef::RawMaterial(raw_material(&pointing));
        assert_eq!(service.stock_on_hand(raw, None).await.unwrap(), dec!(-35));
        let silo = LocationRef::Silo(good.silos[0]);
        assert_eq!(service.stock_on_hand(raw, Some(silo)).await.unwrap(), dec!(-30));
    }
}
