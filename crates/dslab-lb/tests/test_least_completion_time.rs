mod common;
use common::{no_vms, rng, vms_with_cores};

use dslab_lb::error::LbError;
use dslab_lb::policies::least_completion_time::LeastCompletionTimePolicy;
use dslab_lb::policy::LoadBalancingPolicy;
use dslab_lb::tracker::AllocationTracker;

#[test]
fn test_empty_tracker_selects_first_vm() {
    for n in 1..6 {
        let vms = vms_with_cores(&vec![2; n]);
        let mut policy = LeastCompletionTimePolicy::new();
        policy.initialize(&vms).unwrap();
        assert_eq!(policy.select_vm(&vms, &mut rng()).unwrap(), 0);
    }
}

#[test]
fn test_equal_mips_first_index_wins() {
    let vms = vms_with_cores(&[5, 3]);
    let mut policy = LeastCompletionTimePolicy::new();
    policy.initialize(&vms).unwrap();
    assert_eq!(policy.select_vm(&vms, &mut rng()).unwrap(), 0);
    assert_eq!(policy.tracker().count(0), 1);
    assert_eq!(policy.tracker().count(1), 0);
}

#[test]
fn test_tie_resolved_to_lowest_index() {
    let vms = vms_with_cores(&[1, 1, 1, 1]);
    let tracker = AllocationTracker::from_counts([(0, 2), (1, 1), (2, 2), (3, 1)]);
    let policy = LeastCompletionTimePolicy::new().with_tracker(tracker);
    assert_eq!(policy.choose(&vms), Some(1));
}

#[test]
fn test_faster_vm_receives_more_cloudlets() {
    let vms = vms_with_cores(&[1, 2]);
    let mut policy = LeastCompletionTimePolicy::new();
    policy.initialize(&vms).unwrap();
    let mut rng = rng();
    let selected: Vec<usize> = (0..6).map(|_| policy.select_vm(&vms, &mut rng).unwrap()).collect();
    assert_eq!(selected, vec![0, 1, 1, 0, 1, 1]);
    assert_eq!(policy.tracker().count(0), 2);
    assert_eq!(policy.tracker().count(1), 4);
}

#[test]
fn test_vm_without_cores_uses_default_mips() {
    let vms = vms_with_cores(&[0, 1]);
    let policy = LeastCompletionTimePolicy::new().with_tracker(AllocationTracker::from_counts([(0, 1)]));
    assert_eq!(policy.load_metric(&vms, 0), 0.001);
    assert_eq!(policy.choose(&vms), Some(1));
}

#[test]
fn test_choose_is_pure() {
    let vms = vms_with_cores(&[4, 2, 8]);
    let tracker = AllocationTracker::from_counts([(0, 3), (1, 1), (2, 5)]);
    let policy = LeastCompletionTimePolicy::new().with_tracker(tracker.clone());
    let other = LeastCompletionTimePolicy::new().with_tracker(tracker);
    let first = policy.choose(&vms);
    assert_eq!(policy.choose(&vms), first);
    assert_eq!(other.choose(&vms), first);
    assert_eq!(policy.tracker().total(), 9);
}

#[test]
fn test_no_vms() {
    let mut policy = LeastCompletionTimePolicy::new();
    assert!(matches!(policy.initialize(&no_vms()), Err(LbError::NoVmAvailable)));
    assert!(matches!(
        policy.select_vm(&no_vms(), &mut rng()),
        Err(LbError::NoVmAvailable)
    ));
    assert_eq!(policy.tracker().total(), 0);
}
