//! Catalog of reproducible cluster faults.
//!
//! Each scenario is a trio of shell recipes: inject the fault, fix it,
//! and verify the fix took. `expect_name` is the resource name the
//! diagnosis must surface for the workflow to proceed.

/// One reproducible fault with its remediation recipes.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Catalog key, e.g. `pod-wrong-image`
    pub key: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Resource kind the fault manifests on
    pub kind: &'static str,
    /// Resource name the diagnosis is expected to report
    pub expect_name: &'static str,
    /// Shell recipe that injects the fault
    pub inject: &'static str,
    /// Shell recipe that fixes the fault
    pub fix: &'static str,
    /// What the fix does, for narration and tickets
    pub fix_description: &'static str,
    /// Shell recipe that checks the fix took; exit 0 means healthy
    pub verify: &'static str,
}

impl Scenario {
    /// Whether the verify recipe checks that the resource is gone rather
    /// than healthy.
    #[must_use]
    pub fn verifies_removal(&self) -> bool {
        self.verify.contains("NotFound")
    }
}

/// All known fault scenarios.
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        key: "pod-wrong-image",
        name: "Pod with wrong image",
        kind: "Pod",
        expect_name: "broken-image-pod",
        inject: "kubectl run broken-image-pod --image=nginx:nonexistent --restart=Never",
        fix: "kubectl set image pod/broken-image-pod broken-image-pod=nginx:latest",
        fix_description: "Update pod image to nginx:latest",
        verify: "kubectl get pod broken-image-pod -o jsonpath='{.status.phase}' 2>/dev/null | grep -q Running",
    },
    Scenario {
        key: "pod-crashloop",
        name: "Pod crash loop",
        kind: "Pod",
        expect_name: "crashloop-pod",
        inject: r#"cat <<EOF | kubectl apply -f -
apiVersion: v1
kind: Pod
metadata:
  name: crashloop-pod
spec:
  containers:
  - name: app
    image: busybox
    command: ["sh", "-c", "exit 1"]
EOF"#,
        fix: r#"kubectl patch pod crashloop-pod -p '{"spec":{"containers":[{"name":"app","image":"busybox","command":["sh","-c","sleep 3600"]}]}}' || kubectl delete pod crashloop-pod --force --grace-period=0 && kubectl run crashloop-pod --image=busybox --command -- sh -c 'sleep 3600'"#,
        fix_description: "Fix pod command to run successfully",
        verify: "kubectl get pod crashloop-pod -o jsonpath='{.status.phase}' | grep -q Running",
    },
    Scenario {
        key: "service-no-endpoints",
        name: "Service with no endpoints",
        kind: "Service",
        expect_name: "broken-service",
        inject: r#"cat <<EOF | kubectl apply -f -
apiVersion: v1
kind: Service
metadata:
  name: broken-service
spec:
  selector:
    app: nonexistent
  ports:
  - port: 80
EOF
# Create a pod that matches
kubectl run test-backend --image=nginx --labels=app=backend
"#,
        fix: r#"kubectl patch service broken-service -p '{"spec":{"selector":{"app":"backend"}}}'"#,
        fix_description: "Update service selector to match existing pod",
        verify: "kubectl get endpoints broken-service -o jsonpath='{.subsets[0].addresses[0].ip}' | grep -q .",
    },
    Scenario {
        key: "pvc-pending",
        name: "PVC pending",
        kind: "PersistentVolumeClaim",
        expect_name: "broken-pvc",
        inject: r#"cat <<EOF | kubectl apply -f -
apiVersion: v1
kind: PersistentVolumeClaim
metadata:
  name: broken-pvc
spec:
  accessModes:
  - ReadWriteOnce
  storageClassName: nonexistent
  resources:
    requests:
      storage: 1Gi
EOF"#,
        fix: r#"kubectl delete pvc broken-pvc && cat <<EOF | kubectl apply -f -
apiVersion: v1
kind: PersistentVolumeClaim
metadata:
  name: broken-pvc
spec:
  accessModes:
  - ReadWriteOnce
  storageClassName: standard
  resources:
    requests:
      storage: 1Gi
EOF"#,
        fix_description: "Recreate PVC with valid storage class",
        verify: "kubectl get pvc broken-pvc -o jsonpath='{.spec.storageClassName}' | grep -q standard",
    },
    Scenario {
        key: "secret-unused",
        name: "Unused secret",
        kind: "Secret",
        expect_name: "unused-secret",
        inject: "kubectl create secret generic unused-secret --from-literal=key=value",
        fix: "kubectl delete secret unused-secret",
        fix_description: "Remove the unused secret",
        verify: "kubectl get secret unused-secret 2>&1 | grep -q 'NotFound'",
    },
    Scenario {
        key: "cronjob-failed",
        name: "CronJob with failing job",
        kind: "CronJob",
        expect_name: "broken-cronjob",
        inject: r#"cat <<EOF | kubectl apply -f -
apiVersion: batch/v1
kind: CronJob
metadata:
  name: broken-cronjob
spec:
  schedule: "*/1 * * * *"
  jobTemplate:
    spec:
      template:
        spec:
          containers:
          - name: app
            image: busybox
            command: ["sh", "-c", "exit 1"]
          restartPolicy: Never
EOF"#,
        fix: r#"kubectl patch cronjob broken-cronjob -p '{"spec":{"jobTemplate":{"spec":{"template":{"spec":{"containers":[{"name":"app","image":"busybox","command":["sh","-c","echo success"]}]}}}}}}'"#,
        fix_description: "Fix cronjob command to succeed",
        verify: "kubectl get cronjob broken-cronjob -o jsonpath='{.spec.jobTemplate.spec.template.spec.containers[0].command[2]}' | grep -q success",
    },
];

/// Look up a scenario by its catalog key.
#[must_use]
pub fn find(key: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key == key)
}
