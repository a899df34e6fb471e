// packages/engine/tests/scenarios.rs
//! End-to-end journeys through the in-process simulation

use atc_sim_engine::channel::{ChannelHandle, ChannelRegistry, MemoryChannel};
use atc_sim_engine::protocol::{
    request_shutdown, AirportActor, Controller, FlightRecord, JourneyOutcome, PlaneCategory,
    ProtocolPhase,
};
use atc_sim_engine::recording::FlightLog;
use atc_sim_engine::runway::{AllocationKind, RunwayPool, ServiceTimes, BACKUP_CAPACITY};
use atc_sim_engine::simulation::{AirportSpec, Simulation, SimulationConfig};
use atc_sim_engine::SimError;
use std::sync::Arc;
use std::time::Duration;

fn flight(plane_id: u32, departure: u32, arrival: u32, weight: u32) -> FlightRecord {
    FlightRecord {
        phase: ProtocolPhase::Request,
        plane_id,
        departure,
        arrival,
        weight,
        category: PlaneCategory::Cargo,
        passengers: 0,
        flag: 0,
    }
}

fn single_airport(capacity: u32) -> SimulationConfig {
    SimulationConfig {
        channel_name: "scenario".to_string(),
        airports: vec![AirportSpec::new(1, [capacity])],
        service: ServiceTimes::instant(),
        require_even_runways: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_single_airport_regular_runway() {
    let sim = Simulation::new(Arc::new(ChannelRegistry::new()), single_airport(10000)).unwrap();

    let report = sim.run(vec![flight(77, 1, 1, 8000)]).await.unwrap();

    assert_eq!(report.controller.journeys.len(), 1);
    assert_eq!(
        report.controller.journeys[0].phases,
        ProtocolPhase::JOURNEY.to_vec()
    );

    let airport = &report.airports[0];
    assert_eq!(airport.departures.len(), 1);
    assert_eq!(airport.arrivals.len(), 1);
    for assignment in airport.departures.iter().chain(&airport.arrivals) {
        assert_eq!(assignment.kind, AllocationKind::BestFit);
        assert_eq!(assignment.runway_number, 1);
        assert_eq!(assignment.capacity, 10000);
    }

    match &report.outcomes[0] {
        JourneyOutcome::Completed(record) => {
            assert_eq!(record.plane_id, 77);
            assert_eq!(record.phase, ProtocolPhase::Complete);
            assert_eq!(record.weight, 8000);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_overweight_plane_uses_backup_both_legs() {
    let sim = Simulation::new(Arc::new(ChannelRegistry::new()), single_airport(9000)).unwrap();

    let report = sim.run(vec![flight(5, 1, 1, 9999)]).await.unwrap();
    assert_eq!(report.completed(), 1);

    let airport = &report.airports[0];
    for assignment in airport.departures.iter().chain(&airport.arrivals) {
        assert_eq!(assignment.kind, AllocationKind::Backup);
        assert_eq!(assignment.capacity, BACKUP_CAPACITY);
        // Backup follows the regular runways
        assert_eq!(assignment.runway_number, 2);
    }
}

#[tokio::test]
async fn test_shutdown_while_controller_waits() {
    let memory = Arc::new(MemoryChannel::new("scenario-shutdown"));
    let channel: ChannelHandle = memory.clone();

    let pool = Arc::new(RunwayPool::new(1, &[5000, 6000]).unwrap());
    let airport = tokio::spawn(AirportActor::new(pool, ServiceTimes::instant(), channel.clone()).run());
    let controller = tokio::spawn(Controller::new(channel.clone(), FlightLog::disabled()).run());

    tokio::time::sleep(Duration::from_millis(20)).await;
    request_shutdown(&channel).await.unwrap();

    let report = controller.await.unwrap().unwrap();
    assert!(report.journeys.is_empty());
    assert!(report.aborted.is_empty());
    assert!(memory.is_closed());

    // The final completion is still delivered
    let last = channel.recv(ProtocolPhase::Complete).await.unwrap();
    assert!(last.is_aborted());

    // Nothing more gets in
    let late = channel.send(&flight(1, 1, 2, 3000), ProtocolPhase::Request).await;
    assert!(matches!(late, Err(SimError::ChannelClosed)));

    let airport = airport.await.unwrap().unwrap();
    assert!(airport.departures.is_empty());
}

#[tokio::test]
async fn test_odd_runway_count_rejected_before_channel() {
    let registry = Arc::new(ChannelRegistry::new());
    let config = SimulationConfig {
        airports: vec![AirportSpec::new(1, [5000, 6000, 7000])],
        service: ServiceTimes::instant(),
        ..Default::default()
    };

    let err = match Simulation::new(registry.clone(), config) {
        Err(e) => e,
        Ok(_) => panic!("odd runway count accepted"),
    };
    assert!(matches!(err, SimError::ValidationFailed(_)));
    assert!(err.to_string().contains("even"));
    assert!(registry.is_empty());
    assert!(registry.attach("atc-sim").is_err());
}

#[tokio::test]
async fn test_concurrent_aircraft_get_their_own_completion() {
    let config = SimulationConfig {
        channel_name: "scenario-concurrent".to_string(),
        airports: vec![
            AirportSpec::new(1, [4000, 9000]),
            AirportSpec::new(2, [6000, 12000]),
            AirportSpec::new(3, [2000, 3000]),
        ],
        service: ServiceTimes::instant(),
        concurrent: true,
        ..Default::default()
    };
    let sim = Simulation::new(Arc::new(ChannelRegistry::new()), config).unwrap();

    let flights = vec![
        flight(10, 1, 2, 3500),
        flight(11, 2, 3, 7000),
        flight(12, 3, 1, 11000),
        flight(13, 2, 1, 1500),
    ];
    let report = sim.run(flights.clone()).await.unwrap();

    assert_eq!(report.completed(), flights.len());
    for (outcome, flight) in report.outcomes.iter().zip(&flights) {
        assert_eq!(outcome.record().plane_id, flight.plane_id);
        assert_eq!(outcome.record().departure, flight.departure);
        assert_eq!(outcome.record().arrival, flight.arrival);
    }

    // Journeys never interleave at the controller
    for journey in &report.controller.journeys {
        assert_eq!(journey.phases, ProtocolPhase::JOURNEY.to_vec());
    }

    let departures: usize = report.airports.iter().map(|a| a.departures.len()).sum();
    let arrivals: usize = report.airports.iter().map(|a| a.arrivals.len()).sum();
    assert_eq!(departures, 4);
    assert_eq!(arrivals, 4);

    // Airport 3 has nothing big enough for plane 12
    let third = &report.airports[2];
    assert_eq!(third.departures[0].plane_id, 12);
    assert_eq!(third.departures[0].kind, AllocationKind::Backup);
}

#[tokio::test]
async fn test_flight_log_records_each_departure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AirTrafficController.txt");

    let config = SimulationConfig {
        channel_name: "scenario-log".to_string(),
        airports: vec![
            AirportSpec::new(4, [5000, 6000]),
            AirportSpec::new(7, [5000, 6000]),
        ],
        service: ServiceTimes::instant(),
        flight_log: FlightLog::new(&path),
        ..Default::default()
    };
    let sim = Simulation::new(Arc::new(ChannelRegistry::new()), config).unwrap();

    sim.run(vec![flight(1, 4, 7, 4000), flight(2, 7, 4, 5500)])
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        content.lines().collect::<Vec<_>>(),
        vec![
            "Plane 1 has departed from Airport 4 and will land at Airport 7.",
            "Plane 2 has departed from Airport 7 and will land at Airport 4.",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_service_times_hold_runways() {
    let config = SimulationConfig {
        channel_name: "scenario-timing".to_string(),
        airports: vec![
            AirportSpec::new(1, [5000, 6000]),
            AirportSpec::new(2, [5000, 6000]),
        ],
        service: ServiceTimes::default(),
        ..Default::default()
    };
    let sim = Simulation::new(Arc::new(ChannelRegistry::new()), config).unwrap();

    let started = tokio::time::Instant::now();
    let report = sim.run(vec![flight(3, 1, 2, 4500)]).await.unwrap();

    assert_eq!(report.completed(), 1);
    // Boarding, then landing and deboarding, which are joined at stop
    assert!(started.elapsed() >= Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_arrival_overlaps_next_departure() {
    let config = SimulationConfig {
        channel_name: "scenario-overlap".to_string(),
        airports: vec![
            AirportSpec::new(1, [5000, 6000]),
            AirportSpec::new(2, [5000, 6000]),
        ],
        service: ServiceTimes::default(),
        ..Default::default()
    };
    let service = config.service;
    let sim = Simulation::new(Arc::new(ChannelRegistry::new()), config).unwrap();

    let started = tokio::time::Instant::now();
    let report = sim
        .run(vec![flight(1, 1, 2, 4500), flight(2, 2, 1, 4500)])
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.completed(), 2);

    // Plane 1 is still landing on runway 1 when plane 2 boards at airport 2
    let second = &report.airports[1];
    assert_eq!(second.arrivals.len(), 1);
    assert_eq!(second.departures.len(), 1);
    assert_eq!(second.arrivals[0].plane_id, 1);
    assert_eq!(second.arrivals[0].runway_number, 1);
    assert_eq!(second.departures[0].plane_id, 2);
    assert_eq!(second.departures[0].runway_number, 2);
    for assignment in second.departures.iter().chain(&second.arrivals) {
        assert_eq!(assignment.kind, AllocationKind::BestFit);
    }

    for airport in &report.airports {
        assert!(airport.runways.iter().all(|r| r.available));
    }

    let departure = service.boarding;
    let arrival = service.landing + service.deboarding;
    let serial = (departure + arrival) * 2;
    assert!(elapsed >= departure * 2 + arrival);
    assert!(elapsed < serial, "took {:?}, serial would be {:?}", elapsed, serial);
}
